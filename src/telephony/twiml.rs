//! Voice script rendering (TwiML)
//!
//! Pure presentation: session data and turn replies in, markup out.

use super::gather_path;
use crate::runtime::TurnReply;
use crate::session::{Session, SessionConfig, SpeechModel};
use quick_xml::escape::escape;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const APOLOGY_LINE: &str = "Sorry, we could not find this call. Goodbye.";

/// Greeting, then listen for the answer to the opening question
pub fn greeting(session: &Session) -> String {
    let config = &session.config;
    let mut doc = Document::new();
    doc.say(config, &config.greeting);
    doc.gather(&session.session_id, config, Some(&config.opening_question));
    doc.redirect(&gather_path(&session.session_id));
    doc.finish()
}

/// Speak a turn reply and, when asked, listen again
pub fn reply(session: &Session, reply: &TurnReply) -> String {
    let config = &session.config;
    let mut doc = Document::new();
    doc.say(config, &reply.reply_text);
    if reply.reopen_prompt {
        doc.gather(&session.session_id, config, None);
        doc.redirect(&gather_path(&session.session_id));
    } else {
        doc.hangup();
    }
    doc.finish()
}

/// Used when a webhook names a session we do not know
pub fn apology() -> String {
    let mut doc = Document::new();
    doc.body.push_str(&format!("<Say>{}</Say>", escape(APOLOGY_LINE)));
    doc.hangup();
    doc.finish()
}

struct Document {
    body: String,
}

impl Document {
    fn new() -> Self {
        Self {
            body: String::new(),
        }
    }

    fn say(&mut self, config: &SessionConfig, text: &str) {
        self.body.push_str(&format!(
            r#"<Say voice="{}" language="{}">{}</Say>"#,
            escape(config.voice.as_str()),
            escape(config.language.as_str()),
            escape(text)
        ));
    }

    /// Silence falls through to the redirect that follows, which posts an
    /// empty speech result back to the same webhook.
    fn gather(&mut self, session_id: &str, config: &SessionConfig, prompt: Option<&str>) {
        let mut attrs = format!(
            r#"input="speech" action="{}" method="POST" speechTimeout="auto" language="{}""#,
            escape(&gather_path(session_id)),
            escape(config.language.as_str())
        );
        if config.speech_model != SpeechModel::Default {
            attrs.push_str(&format!(r#" speechModel="{}""#, config.speech_model.as_str()));
        }

        self.body.push_str(&format!("<Gather {attrs}>"));
        if let Some(prompt) = prompt {
            self.say(config, prompt);
        }
        self.body.push_str("</Gather>");
    }

    fn redirect(&mut self, path: &str) {
        self.body
            .push_str(&format!(r#"<Redirect method="POST">{}</Redirect>"#, escape(path)));
    }

    fn hangup(&mut self) {
        self.body.push_str("<Hangup/>");
    }

    fn finish(self) -> String {
        format!("{XML_DECLARATION}<Response>{}</Response>", self.body)
    }
}
