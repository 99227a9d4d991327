//! crates/tutor_core/src/classifier.rs
//!
//! Rule-based intent classification.
//!
//! The rule table is plain data: an ordered list of patterns grouped into tiers.
//! A single loop walks it top to bottom and the first match wins, so tier order
//! is the tie-break. Answer-seeking phrasings always beat conceptual ones.

use crate::domain::{Intent, IntentClassification};
use regex::Regex;

const DEFAULT_CONFIDENCE: f32 = 0.6;

/// Priority band of a rule. Lower tiers are checked first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    AnswerSeeking,
    Conceptual,
    QuizContext,
}

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("Invalid pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("Rule '{pattern}' in tier {tier:?} follows a rule from a later tier")]
    TierOrder { pattern: String, tier: Tier },
}

/// One entry of the rule table.
#[derive(Debug, Clone)]
pub struct IntentRule {
    pub tier: Tier,
    pub pattern: Regex,
    pub intent: Intent,
    pub confidence: f32,
    /// Only considered when the student is inside an active quiz.
    pub needs_quiz_context: bool,
    pub reasoning: &'static str,
}

impl IntentRule {
    /// Compiles `pattern` case-insensitively.
    pub fn new(
        tier: Tier,
        pattern: &str,
        intent: Intent,
        confidence: f32,
        reasoning: &'static str,
    ) -> Result<Self, ClassifierError> {
        let compiled =
            Regex::new(&format!("(?i){pattern}")).map_err(|source| ClassifierError::Pattern {
                pattern: pattern.to_string(),
                source,
            })?;
        Ok(Self {
            tier,
            pattern: compiled,
            intent,
            confidence,
            needs_quiz_context: false,
            reasoning,
        })
    }

    pub fn in_quiz_only(mut self) -> Self {
        self.needs_quiz_context = true;
        self
    }

    fn matches(&self, question: &str, quiz_context: bool) -> bool {
        if self.needs_quiz_context && !quiz_context {
            return false;
        }
        self.pattern.is_match(question)
    }
}

const ANSWER_SEEKING: &[&str] = &[
    r"what(?:'|’)?s\s+the\s+(?:correct\s+|right\s+)?answer",
    r"what\s+is\s+the\s+(?:correct\s+|right\s+)?answer",
    r"tell\s+me\s+the\s+(?:correct\s+|right\s+)?answer",
    r"give\s+me\s+the\s+(?:correct\s+|right\s+)?answer",
    r"which\s+(?:option|choice|one)\s+is\s+(?:correct|right)",
    r"\bsolution\s+(?:to|for)\b",
    r"\banswer\s+(?:to|for)\s+(?:question|number|#|q\d)",
    r"\bjust\s+tell\s+me\b",
];

const CONCEPTUAL: &[&str] = &[
    r"\bwhy\b",
    r"\bhow\s+does\b",
    r"\bhow\s+do\b",
    r"\bcan\s+you\s+explain\b",
    r"\bexplain\b",
    r"\bdifference\s+between\b",
    r"\bexample\s+of\b",
    r"\bhow\s+to\b",
    r"\bwhat\s+does\s+.+\s+mean\b",
];

const QUIZ_MENTION: &str = r"\b(?:question|quiz)";

/// Deterministic classifier over an ordered rule table.
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    rules: Vec<IntentRule>,
}

impl IntentClassifier {
    /// The built-in rule table.
    pub fn standard() -> Result<Self, ClassifierError> {
        let mut rules = Vec::with_capacity(ANSWER_SEEKING.len() + CONCEPTUAL.len() + 1);
        for pattern in ANSWER_SEEKING {
            rules.push(IntentRule::new(
                Tier::AnswerSeeking,
                pattern,
                Intent::CheatAttempt,
                0.9,
                "Question asks for a direct answer",
            )?);
        }
        for pattern in CONCEPTUAL {
            rules.push(IntentRule::new(
                Tier::Conceptual,
                pattern,
                Intent::Learn,
                0.8,
                "Question shows conceptual curiosity",
            )?);
        }
        rules.push(
            IntentRule::new(
                Tier::QuizContext,
                QUIZ_MENTION,
                Intent::CheatAttempt,
                0.7,
                "Refers to a quiz question while a quiz is active",
            )?
            .in_quiz_only(),
        );
        Self::with_rules(rules)
    }

    /// Builds a classifier from a custom table. Rules must already be grouped
    /// by tier in priority order.
    pub fn with_rules(rules: Vec<IntentRule>) -> Result<Self, ClassifierError> {
        for pair in rules.windows(2) {
            if pair[1].tier < pair[0].tier {
                return Err(ClassifierError::TierOrder {
                    pattern: pair[1].pattern.as_str().to_string(),
                    tier: pair[1].tier,
                });
            }
        }
        Ok(Self { rules })
    }

    /// Appends a rule at the end of its tier, leaving existing order untouched.
    pub fn push_rule(&mut self, rule: IntentRule) {
        let at = self
            .rules
            .iter()
            .position(|existing| existing.tier > rule.tier)
            .unwrap_or(self.rules.len());
        self.rules.insert(at, rule);
    }

    pub fn rules(&self) -> &[IntentRule] {
        &self.rules
    }

    pub fn classify(&self, question: &str, quiz_context: bool) -> IntentClassification {
        self.rules
            .iter()
            .find(|rule| rule.matches(question, quiz_context))
            .map(|rule| IntentClassification {
                intent: rule.intent,
                confidence: rule.confidence,
                reasoning: rule.reasoning.to_string(),
            })
            .unwrap_or_else(|| IntentClassification {
                intent: Intent::General,
                confidence: DEFAULT_CONFIDENCE,
                reasoning: "No specific pattern matched".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> IntentClassifier {
        IntentClassifier::standard().unwrap()
    }

    #[test]
    fn direct_answer_requests_are_cheat_attempts() {
        let c = classifier();
        for q in [
            "What's the answer to question 3?",
            "what is the correct answer here",
            "Tell me the answer please",
            "Which option is correct?",
            "Can you give me the solution to problem 4",
        ] {
            let result = c.classify(q, false);
            assert_eq!(result.intent, Intent::CheatAttempt, "{q}");
            assert_eq!(result.confidence, 0.9, "{q}");
        }
    }

    #[test]
    fn conceptual_questions_are_learn() {
        let c = classifier();
        for q in [
            "Why does this algorithm use recursion?",
            "How does a hash map resolve collisions?",
            "Can you explain closures",
            "What is the difference between a list and a tuple?",
            "Show me an example of polymorphism",
            "how to reverse a string",
        ] {
            let result = c.classify(q, false);
            assert_eq!(result.intent, Intent::Learn, "{q}");
            assert_eq!(result.confidence, 0.8, "{q}");
        }
    }

    #[test]
    fn answer_seeking_beats_conceptual_when_both_match() {
        let c = classifier();
        let result = c.classify("Why is the answer to question 2 B? Just tell me the answer", false);
        assert_eq!(result.intent, Intent::CheatAttempt);
        assert_eq!(result.confidence, 0.9);

        let result = c.classify("Can you explain which option is correct?", true);
        assert_eq!(result.intent, Intent::CheatAttempt);
    }

    #[test]
    fn quiz_mentions_depend_on_quiz_context() {
        let c = classifier();
        let in_quiz = c.classify("I'm stuck on this quiz", true);
        assert_eq!(in_quiz.intent, Intent::CheatAttempt);
        assert_eq!(in_quiz.confidence, 0.7);

        let outside = c.classify("I'm stuck on this quiz", false);
        assert_eq!(outside.intent, Intent::General);
        assert_eq!(outside.confidence, 0.6);

        let question_word = c.classify("Look at question 5 with me", true);
        assert_eq!(question_word.intent, Intent::CheatAttempt);
    }

    #[test]
    fn conceptual_question_in_quiz_stays_learn() {
        let result = classifier().classify("Why does this quiz question use a loop?", true);
        assert_eq!(result.intent, Intent::Learn);
    }

    #[test]
    fn unmatched_text_is_general() {
        let result = classifier().classify("Recursion is neat", false);
        assert_eq!(result.intent, Intent::General);
        assert!(!result.reasoning.is_empty());
    }

    #[test]
    fn classification_is_deterministic() {
        let c = classifier();
        let q = "What does encapsulation mean?";
        assert_eq!(c.classify(q, false), c.classify(q, false));
    }

    #[test]
    fn standard_table_never_yields_inappropriate() {
        assert!(classifier()
            .rules()
            .iter()
            .all(|rule| rule.intent != Intent::Inappropriate));
    }

    #[test]
    fn interleaved_tiers_are_rejected() {
        let rules = vec![
            IntentRule::new(Tier::Conceptual, r"\bwhy\b", Intent::Learn, 0.8, "learn").unwrap(),
            IntentRule::new(Tier::AnswerSeeking, "answer", Intent::CheatAttempt, 0.9, "cheat")
                .unwrap(),
        ];
        assert!(matches!(
            IntentClassifier::with_rules(rules),
            Err(ClassifierError::TierOrder { tier: Tier::AnswerSeeking, .. })
        ));
    }

    #[test]
    fn push_rule_appends_within_its_tier() {
        let mut c = classifier();
        let answer_rules = c
            .rules()
            .iter()
            .filter(|r| r.tier == Tier::AnswerSeeking)
            .count();
        c.push_rule(
            IntentRule::new(
                Tier::AnswerSeeking,
                r"\bdo\s+my\s+homework\b",
                Intent::CheatAttempt,
                0.9,
                "Asks for the work to be done",
            )
            .unwrap(),
        );

        assert_eq!(c.rules()[answer_rules].pattern.as_str(), r"(?i)\bdo\s+my\s+homework\b");
        assert_eq!(c.classify("Why won't you do my homework", false).intent, Intent::CheatAttempt);
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = IntentRule::new(Tier::Conceptual, "(", Intent::Learn, 0.8, "bad").unwrap_err();
        assert!(matches!(err, ClassifierError::Pattern { .. }));
    }
}
