use serde::{Deserialize, Serialize};

use crate::board::{Message, VoteDirection};

/// Inbound events. Anything that fails to parse into one of these is
/// dropped at the socket boundary before it reaches the board.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type")]
pub enum ClientEvent {
    #[serde(rename = "send_message")]
    SendMessage { text: String },
    #[serde(rename = "vote_message", rename_all = "camelCase")]
    VoteMessage {
        message_id: String,
        vote_type: VoteDirection,
    },
}

/// Outbound events, fanned out to every registered session.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type")]
pub enum ServerEvent {
    #[serde(rename = "username_assigned")]
    UsernameAssigned { pseudonym: String },
    #[serde(rename = "initial_messages")]
    InitialMessages { messages: Vec<Message> },
    #[serde(rename = "user_count")]
    UserCount { count: usize },
    #[serde(rename = "new_message")]
    NewMessage(Message),
    #[serde(rename = "message_updated", rename_all = "camelCase")]
    MessageUpdated {
        message_id: String,
        votes: i64,
        voters: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::time::SystemTime;

    fn sample_message() -> Message {
        Message {
            id: "m-1".to_string(),
            text: "hello".to_string(),
            author_pseudonym: "SwiftOtter42".to_string(),
            created_at: SystemTime::UNIX_EPOCH,
            score: 0,
            voters: HashSet::new(),
        }
    }

    #[test]
    fn client_events_parse_from_tagged_json() {
        let event: ClientEvent =
            serde_json::from_str(r#"{"type":"send_message","text":"hi"}"#).unwrap();
        assert!(matches!(event, ClientEvent::SendMessage { text } if text == "hi"));

        let event: ClientEvent = serde_json::from_str(
            r#"{"type":"vote_message","messageId":"m-1","voteType":"down"}"#,
        )
        .unwrap();
        assert!(matches!(
            event,
            ClientEvent::VoteMessage { message_id, vote_type: VoteDirection::Down }
                if message_id == "m-1"
        ));
    }

    #[test]
    fn unknown_type_and_bad_vote_direction_are_rejected() {
        assert!(serde_json::from_str::<ClientEvent>(r#"{"type":"shout","text":"hi"}"#).is_err());
        assert!(serde_json::from_str::<ClientEvent>(
            r#"{"type":"vote_message","messageId":"m-1","voteType":"sideways"}"#
        )
        .is_err());
    }

    #[test]
    fn new_message_serializes_flat_with_camel_case_fields() {
        let json =
            serde_json::to_value(ServerEvent::NewMessage(sample_message())).unwrap();
        assert_eq!(json["type"], "new_message");
        assert_eq!(json["id"], "m-1");
        assert_eq!(json["authorPseudonym"], "SwiftOtter42");
        assert_eq!(json["score"], 0);
        assert!(json["voters"].as_array().unwrap().is_empty());
    }

    #[test]
    fn message_updated_serializes_contract_keys() {
        let json = serde_json::to_value(ServerEvent::MessageUpdated {
            message_id: "m-1".to_string(),
            votes: -2,
            voters: vec!["a".to_string(), "b".to_string()],
        })
        .unwrap();
        assert_eq!(json["type"], "message_updated");
        assert_eq!(json["messageId"], "m-1");
        assert_eq!(json["votes"], -2);
        assert_eq!(json["voters"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn connect_events_serialize_expected_payloads() {
        let json = serde_json::to_value(ServerEvent::UsernameAssigned {
            pseudonym: "QuietLynx7".to_string(),
        })
        .unwrap();
        assert_eq!(json["type"], "username_assigned");
        assert_eq!(json["pseudonym"], "QuietLynx7");

        let json = serde_json::to_value(ServerEvent::UserCount { count: 3 }).unwrap();
        assert_eq!(json["type"], "user_count");
        assert_eq!(json["count"], 3);

        let json = serde_json::to_value(ServerEvent::InitialMessages {
            messages: vec![sample_message()],
        })
        .unwrap();
        assert_eq!(json["type"], "initial_messages");
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
    }
}
