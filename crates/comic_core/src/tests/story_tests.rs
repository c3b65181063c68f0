use super::*;
use async_trait::async_trait;
use provider::ProviderError;
use tokio::sync::Mutex;

struct ScriptedText {
    reply: Result<String, String>,
    requests: Mutex<Vec<TextRequest>>,
}

impl ScriptedText {
    fn replying(body: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(body.to_string()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            requests: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl TextGenerator for ScriptedText {
    async fn generate_text(&self, request: TextRequest) -> Result<String, ProviderError> {
        self.requests.lock().await.push(request);
        self.reply.clone().map_err(ProviderError::Http)
    }
}

fn panels_json(count: usize) -> String {
    let panels: Vec<String> = (0..count)
        .map(|i| format!(r#"{{"imagePrompt":"prompt {i}","caption":"caption {i}"}}"#))
        .collect();
    panels.join(",")
}

#[tokio::test]
async fn valid_story_passes_through() {
    let body = format!(
        "  {{\"title\":\"The Cucumber Incident\",\"panels\":[{}]}}\n",
        panels_json(4)
    );
    let text = ScriptedText::replying(&body);
    let generator = StoryGenerator::new(text.clone(), "gemini-2.5-flash");

    let theme = Theme::new("encountering a cucumber for the first time");
    let story = generator.generate_story(&theme).await.expect("story");
    assert_eq!(story.title, "The Cucumber Incident");
    assert_eq!(story.panels.len(), 4);
    assert_eq!(story.panels[2].image_prompt, "prompt 2");
    assert_eq!(story.panels[2].caption, "caption 2");

    let requests = text.requests.lock().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].model, "gemini-2.5-flash");
    assert!(requests[0]
        .prompt
        .contains("\"encountering a cucumber for the first time\""));
    assert_eq!(requests[0].response_schema, story_schema());
}

#[tokio::test]
async fn three_panels_is_invalid_shape() {
    let body = format!("{{\"title\":\"X\",\"panels\":[{}]}}", panels_json(3));
    let generator = StoryGenerator::new(ScriptedText::replying(&body), "m");
    let err = generator
        .generate_story(&Theme::new("t"))
        .await
        .expect_err("should reject");
    assert!(matches!(err, ComicError::InvalidStoryShape(_)));
    assert!(err.to_string().contains("got 3"));
}

#[test]
fn five_panels_are_rejected_not_truncated() {
    let body = format!("{{\"title\":\"X\",\"panels\":[{}]}}", panels_json(5));
    let err = parse_story(&body).expect_err("should reject");
    assert!(matches!(err, ComicError::InvalidStoryShape(_)));
}

#[test]
fn missing_or_blank_title_is_invalid_shape() {
    let missing = format!("{{\"panels\":[{}]}}", panels_json(4));
    assert!(matches!(parse_story(&missing), Err(ComicError::InvalidStoryShape(_))));

    let blank = format!("{{\"title\":\"  \",\"panels\":[{}]}}", panels_json(4));
    assert!(matches!(parse_story(&blank), Err(ComicError::InvalidStoryShape(_))));
}

#[test]
fn missing_panels_or_panel_fields_is_invalid_shape() {
    assert!(matches!(
        parse_story(r#"{"title":"X"}"#),
        Err(ComicError::InvalidStoryShape(_))
    ));
    assert!(matches!(
        parse_story(r#"{"title":"X","panels":[{"caption":"no prompt"}]}"#),
        Err(ComicError::InvalidStoryShape(_))
    ));
}

#[test]
fn non_json_body_is_malformed_response() {
    let err = parse_story("Here is your comic: {title").expect_err("should reject");
    match err {
        ComicError::MalformedResponse { raw, .. } => {
            assert_eq!(raw, "Here is your comic: {title");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn provider_failure_is_propagated_without_retry() {
    let text = ScriptedText::failing("connection reset");
    let generator = StoryGenerator::new(text.clone(), "m");
    let err = generator
        .generate_story(&Theme::new("t"))
        .await
        .expect_err("should fail");
    assert!(matches!(err, ComicError::Provider(ProviderError::Http(_))));
    assert_eq!(text.requests.lock().await.len(), 1);
}

#[test]
fn prompt_describes_four_beats() {
    let prompt = story_prompt(&Theme::new("hiding from a bath"));
    for beat in ["Setup", "Complication", "Escalation", "Punchline"] {
        assert!(prompt.contains(beat), "missing beat {beat}");
    }
}
