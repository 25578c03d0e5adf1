use serde::{Deserialize, Serialize};

/// Reply from the conversational-AI endpoint. Only the completion signal
/// matters to the proctor; the rest is carried through for the host.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    #[serde(default, alias = "response")]
    pub text: String,
    #[serde(default, alias = "isOver", alias = "interview_over")]
    pub interview_over: bool,
}

impl ChatReply {
    pub fn signals_completion(&self) -> bool {
        self.interview_over
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_completion_flag_aliases() {
        let over: ChatReply =
            serde_json::from_str(r#"{"response":"Thanks for your time.","isOver":true}"#).unwrap();
        assert!(over.signals_completion());
        assert_eq!(over.text, "Thanks for your time.");

        let snake: ChatReply = serde_json::from_str(r#"{"interview_over":true}"#).unwrap();
        assert!(snake.signals_completion());
    }

    #[test]
    fn missing_flag_means_ongoing() {
        let reply: ChatReply = serde_json::from_str(r#"{"text":"Next question..."}"#).unwrap();
        assert!(!reply.signals_completion());
    }
}
