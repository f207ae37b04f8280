use std::fmt;

pub const QUIZ_TITLE: &str = "Am I living my own life?";

pub const QUIZ_INTRO: &str = "Answer each question by pressing \"✅ Yes\" or \"❌ No\".";

pub const QUESTION_COUNT: usize = 20;

pub const QUESTIONS: [&str; QUESTION_COUNT] = [
    "Do you feel that your life is filled with meaning?",
    "Do you do something that brings you joy every day?",
    "Do you clearly understand what you want from life?",
    "Do you live according to your own values?",
    "Is it easy for you to give up things that bring you no joy?",
    "Do you often feel that time goes by the way you want it to?",
    "Do you have dreams and goals that you are actively pursuing?",
    "Are you unafraid to try new things and leave your comfort zone?",
    "Do you feel like the master of your life rather than a victim of circumstance?",
    "Do you like the way you spend your free time?",
    "Do you feel that your decisions are based on your own wishes rather than on the expectations of others?",
    "Do you have a sense of inner harmony and satisfaction?",
    "Do you feel that you are growing as a person?",
    "Do you have enough time for your own interests and hobbies?",
    "Can you say that you live in the present moment rather than in the past or the future?",
    "Do you often feel inspired and enthusiastic?",
    "Do you find it easy to make decisions that are good for you?",
    "Do you feel that you are in control of your life rather than drifting with the current?",
    "Are you unafraid to take responsibility for your life?",
    "Do you feel that you are living exactly the way you want to?",
];

/// One of the four interpretations, picked by the number of "yes" answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// 15 or more.
    Conscious,
    /// 10 to 14.
    Striving,
    /// 5 to 9.
    Drifting,
    /// Fewer than 5.
    OthersExpectations,
}

impl Verdict {
    pub fn from_yes_count(yes_count: usize) -> Self {
        match yes_count {
            15.. => Verdict::Conscious,
            10..=14 => Verdict::Striving,
            5..=9 => Verdict::Drifting,
            _ => Verdict::OthersExpectations,
        }
    }

    pub fn text(&self) -> &'static str {
        match self {
            Verdict::Conscious => {
                "You are living your life consciously and in line with your own desires."
            }
            Verdict::Striving => {
                "You strive to live your own life, but sometimes you drift off your path."
            }
            Verdict::Drifting => {
                "You are often driven by external circumstances and give little time to your own desires."
            }
            Verdict::OthersExpectations => {
                "You may be living by other people's expectations and missing the chance to realize yourself."
            }
        }
    }

    /// The message sent to the participant once the last question is answered.
    pub fn message(&self) -> String {
        format!("Test complete!\n{}", self.text())
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text())
    }
}

pub fn compute_verdict(answers: &[bool]) -> Verdict {
    let yes_count = answers.iter().filter(|answer| **answer).count();
    Verdict::from_yes_count(yes_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers_with_yes(yes_count: usize) -> Vec<bool> {
        (0..QUESTION_COUNT).map(|i| i < yes_count).collect()
    }

    #[test]
    fn test_band_boundaries() {
        assert_eq!(Verdict::from_yes_count(4), Verdict::OthersExpectations);
        assert_eq!(Verdict::from_yes_count(5), Verdict::Drifting);
        assert_eq!(Verdict::from_yes_count(9), Verdict::Drifting);
        assert_eq!(Verdict::from_yes_count(10), Verdict::Striving);
        assert_eq!(Verdict::from_yes_count(14), Verdict::Striving);
        assert_eq!(Verdict::from_yes_count(15), Verdict::Conscious);
    }

    #[test]
    fn test_every_count_maps_to_its_band() {
        for yes_count in 0..=QUESTION_COUNT {
            let expected = if yes_count >= 15 {
                Verdict::Conscious
            } else if yes_count >= 10 {
                Verdict::Striving
            } else if yes_count >= 5 {
                Verdict::Drifting
            } else {
                Verdict::OthersExpectations
            };
            assert_eq!(compute_verdict(&answers_with_yes(yes_count)), expected);
        }
    }

    #[test]
    fn test_compute_verdict_ignores_answer_order() {
        let mut answers = vec![false; QUESTION_COUNT];
        for idx in [1, 3, 5, 7, 9, 11, 13, 15, 17, 19] {
            answers[idx] = true;
        }
        assert_eq!(compute_verdict(&answers), Verdict::Striving);
    }

    #[test]
    fn test_extremes() {
        assert_eq!(compute_verdict(&[true; QUESTION_COUNT]), Verdict::Conscious);
        assert_eq!(
            compute_verdict(&[false; QUESTION_COUNT]),
            Verdict::OthersExpectations
        );
    }

    #[test]
    fn test_verdict_message_starts_with_completion_line() {
        let message = Verdict::Drifting.message();
        assert!(message.starts_with("Test complete!\n"));
        assert!(message.ends_with(Verdict::Drifting.text()));
    }

    #[test]
    fn test_question_list_is_fixed() {
        assert_eq!(QUESTIONS.len(), 20);
        assert!(QUESTIONS.iter().all(|question| question.ends_with('?')));
    }
}
