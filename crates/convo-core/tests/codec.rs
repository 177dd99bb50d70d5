use convo_core::codec::{self, CONTENT_TYPE};
use convo_core::error::CodecError;
use convo_core::{
    AssistantFileDataPart, AssistantMessage, AssistantPart, FileDataPart, Message, Role,
    UserMessage, UserPart, VideoMetadata,
};
use jiff::{SignedDuration, Timestamp};

fn ts(s: &str) -> Timestamp {
    s.parse().unwrap()
}

fn sample_history() -> Vec<Message> {
    vec![
        Message::User(UserMessage {
            message_id: "m-1".to_string(),
            user_id: "U1".to_string(),
            parts: vec![
                UserPart::text("look at this"),
                UserPart::FileData(FileDataPart {
                    storage_key: "media/U1/clip.mp4".to_string(),
                    mime_type: "video/mp4".to_string(),
                    display_name: "clip.mp4".to_string(),
                    video_metadata: Some(VideoMetadata {
                        start_offset: SignedDuration::from_secs(5),
                        end_offset: SignedDuration::from_millis(90_500),
                        fps: Some(2.0),
                    }),
                }),
            ],
            timestamp: ts("2025-03-01T10:00:00Z"),
        }),
        Message::Assistant(AssistantMessage {
            model_name: "gemini-2.5-flash".to_string(),
            parts: vec![
                AssistantPart::thought("considering the clip", "c2lnbmF0dXJl"),
                AssistantPart::text("It is a cat."),
                AssistantPart::FileData(AssistantFileDataPart {
                    storage_key: "media/generated/cat.png".to_string(),
                    mime_type: "image/png".to_string(),
                    display_name: "cat.png".to_string(),
                }),
            ],
            timestamp: ts("2025-03-01T10:00:03Z"),
        }),
        Message::User(UserMessage::text("U1", "", ts("2025-03-01T10:00:03Z"))),
    ]
}

#[test]
fn round_trip_preserves_every_field_and_order() {
    let history = sample_history();
    let bytes = codec::encode(&history).unwrap();
    let decoded = codec::decode("room-1", &bytes).unwrap();
    assert_eq!(decoded, history);
}

#[test]
fn encode_writes_one_line_per_message_with_trailing_newline() {
    let bytes = codec::encode(&sample_history()).unwrap();
    let text = String::from_utf8(bytes).unwrap();
    assert!(text.ends_with('\n'));
    assert_eq!(text.lines().count(), 3);
    assert!(text.lines().next().unwrap().starts_with(r#"{"role":"user""#));
    assert!(text.lines().nth(1).unwrap().starts_with(r#"{"role":"assistant""#));
}

#[test]
fn encode_empty_history_is_empty() {
    assert!(codec::encode(&[]).unwrap().is_empty());
    assert!(codec::decode("room-1", b"").unwrap().is_empty());
}

#[test]
fn empty_optional_fields_are_omitted() {
    let history = vec![
        Message::User(UserMessage::text("U1", "hi", ts("2025-01-01T00:00:00Z"))),
        Message::Assistant(AssistantMessage::text("m", "hello", ts("2025-01-01T00:00:01Z"))),
    ];
    let text = String::from_utf8(codec::encode(&history).unwrap()).unwrap();
    assert!(!text.contains("messageId"));
    assert!(!text.contains("thought"));
    assert!(!text.contains("videoMetadata"));
    assert!(!text.contains("null"));
}

#[test]
fn legacy_record_without_message_id_decodes() {
    let line = r#"{"role":"user","userId":"U1","parts":[{"type":"text","text":"old"}],"timestamp":"2025-01-01T00:00:00Z"}"#;
    let messages = codec::decode("U1", line.as_bytes()).unwrap();
    assert_eq!(messages.len(), 1);
    let Message::User(user) = &messages[0] else {
        panic!("expected a user message");
    };
    assert_eq!(user.message_id, "");
    assert_eq!(user.user_id, "U1");
    assert_eq!(user.parts, vec![UserPart::text("old")]);
    assert_eq!(user.timestamp, ts("2025-01-01T00:00:00Z"));
}

#[test]
fn null_optional_fields_decode_like_absent_ones() {
    let with_nulls = concat!(
        r#"{"role":"user","messageId":null,"userId":"U1","parts":[{"type":"file_data","storageKey":"k","mimeType":"image/png","displayName":"a.png","videoMetadata":null}],"timestamp":"2025-01-01T00:00:00Z"}"#,
        "\n",
        r#"{"role":"assistant","modelName":"m","parts":[{"type":"text","text":"x","thought":null,"thoughtSignature":null}],"timestamp":"2025-01-01T00:00:00Z"}"#,
        "\n",
    );
    let without = concat!(
        r#"{"role":"user","userId":"U1","parts":[{"type":"file_data","storageKey":"k","mimeType":"image/png","displayName":"a.png"}],"timestamp":"2025-01-01T00:00:00Z"}"#,
        "\n",
        r#"{"role":"assistant","modelName":"m","parts":[{"type":"text","text":"x"}],"timestamp":"2025-01-01T00:00:00Z"}"#,
        "\n",
    );
    assert_eq!(
        codec::decode("k", with_nulls.as_bytes()).unwrap(),
        codec::decode("k", without.as_bytes()).unwrap()
    );
}

#[test]
fn unknown_fields_are_ignored() {
    let line = r#"{"role":"assistant","modelName":"m","tokens":12,"parts":[{"type":"text","text":"x","score":0.5}],"timestamp":"2025-01-01T00:00:00Z"}"#;
    let messages = codec::decode("k", line.as_bytes()).unwrap();
    assert_eq!(messages[0].role(), Role::Assistant);
    assert_eq!(messages[0].text(), "x");
}

#[test]
fn blank_lines_are_skipped() {
    let compact = codec::encode(&sample_history()).unwrap();
    let text = String::from_utf8(compact.clone()).unwrap();
    let padded = format!("\n  \n{}\n\t\n\r\n", text.replace('\n', "\n   \n"));
    assert_eq!(
        codec::decode("k", padded.as_bytes()).unwrap(),
        codec::decode("k", &compact).unwrap()
    );
}

#[test]
fn unknown_role_is_rejected_with_key_and_line() {
    let input = concat!(
        r#"{"role":"user","userId":"U1","parts":[],"timestamp":"2025-01-01T00:00:00Z"}"#,
        "\n\n",
        r#"{"role":"system","parts":[],"timestamp":"2025-01-01T00:00:00Z"}"#,
        "\n",
    );
    let err = codec::decode("group-7", input.as_bytes()).unwrap_err();
    match &err {
        CodecError::Parse { key, line, .. } => {
            assert_eq!(key, "group-7");
            assert_eq!(*line, 3);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().contains("group-7"));
}

#[test]
fn unknown_part_type_is_rejected() {
    let line = r#"{"role":"user","userId":"U1","parts":[{"type":"inline_data","data":"AAAA"}],"timestamp":"2025-01-01T00:00:00Z"}"#;
    let err = codec::decode("U1", line.as_bytes()).unwrap_err();
    assert!(matches!(err, CodecError::Parse { line: 1, .. }));
}

#[test]
fn missing_role_is_rejected() {
    let line = r#"{"userId":"U1","parts":[],"timestamp":"2025-01-01T00:00:00Z"}"#;
    assert!(codec::decode("U1", line.as_bytes()).is_err());
}

#[test]
fn invalid_json_is_rejected() {
    let err = codec::decode("U1", b"{not json}\n").unwrap_err();
    assert!(matches!(err, CodecError::Parse { line: 1, .. }));
}

#[test]
fn invalid_utf8_is_rejected() {
    let err = codec::decode("U1", &[0xff, 0xfe, b'\n']).unwrap_err();
    assert!(matches!(err, CodecError::InvalidUtf8 { .. }));
}

#[test]
fn video_offsets_accept_go_and_iso_forms() {
    let line = r#"{"role":"user","userId":"U1","parts":[{"type":"file_data","storageKey":"k","mimeType":"video/mp4","displayName":"v","videoMetadata":{"startOffset":"1m30s","endOffset":"PT2M"}}],"timestamp":"2025-01-01T00:00:00Z"}"#;
    let messages = codec::decode("U1", line.as_bytes()).unwrap();
    let Message::User(user) = &messages[0] else {
        panic!("expected a user message");
    };
    let UserPart::FileData(file) = &user.parts[0] else {
        panic!("expected a file part");
    };
    let video = file.video_metadata.as_ref().unwrap();
    assert_eq!(video.start_offset, SignedDuration::from_secs(90));
    assert_eq!(video.end_offset, SignedDuration::from_secs(120));
    assert_eq!(video.fps, None);
}

#[test]
fn message_text_skips_thoughts() {
    let message = Message::Assistant(AssistantMessage {
        model_name: "m".to_string(),
        parts: vec![AssistantPart::thought("hmm", "sig"), AssistantPart::text("answer")],
        timestamp: ts("2025-01-01T00:00:00Z"),
    });
    assert_eq!(message.text(), "answer");
}

#[test]
fn content_type_is_jsonl() {
    assert_eq!(CONTENT_TYPE, "application/jsonl");
}

#[test]
fn non_finite_fps_fails_to_encode() {
    for fps in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let history = vec![Message::User(UserMessage {
            message_id: String::new(),
            user_id: "U1".to_string(),
            parts: vec![UserPart::FileData(FileDataPart {
                storage_key: "media/U1/clip.mp4".to_string(),
                mime_type: "video/mp4".to_string(),
                display_name: "clip.mp4".to_string(),
                video_metadata: Some(VideoMetadata {
                    fps: Some(fps),
                    ..Default::default()
                }),
            })],
            timestamp: ts("2025-01-01T00:00:00Z"),
        })];
        let err = codec::encode(&history).unwrap_err();
        assert!(matches!(err, CodecError::Encode(_)), "{fps}: {err:?}");
        let cause = std::error::Error::source(&err).unwrap().to_string();
        assert!(cause.contains("fps"), "{cause}");
    }
}
