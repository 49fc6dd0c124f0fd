//! Session data model and configuration validation

use crate::state_machine::CallStatus;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use thiserror::Error;

static PHONE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+[1-9][0-9]{7,14}$").expect("valid E.164 pattern"));
static LANGUAGE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{2,3}(-[A-Z]{2})?$").expect("valid language pattern"));
static VOICE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(alice|man|woman|(Polly|Google)\.[A-Za-z0-9._-]+)$").expect("valid voice pattern")
});

const DEFAULT_VOICE: &str = "alice";
const DEFAULT_LANGUAGE: &str = "en-US";
const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Rejected session creation payloads
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("target number must be E.164 (e.g. +14155550100): {0}")]
    InvalidPhoneNumber(String),
    #[error("unsupported voice: {0}")]
    InvalidVoice(String),
    #[error("unsupported language tag: {0}")]
    InvalidLanguage(String),
    #[error("unsupported speech model: {0}")]
    InvalidSpeechModel(String),
    #[error("temperature must be between 0.0 and 2.0, got {0}")]
    TemperatureOutOfRange(f32),
}

/// Voice selector understood by the telephony provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Voice(String);

impl Voice {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let raw = raw.trim();
        if VOICE_NAME.is_match(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(ValidationError::InvalidVoice(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// BCP-47 language tag, restricted to `xx`, `xxx` and `xx-YY`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Language(String);

impl Language {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let raw = raw.trim();
        if LANGUAGE_TAG.is_match(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(ValidationError::InvalidLanguage(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Speech recognition model used while gathering caller speech
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeechModel {
    #[default]
    Default,
    PhoneCall,
    NumbersAndCommands,
    ExperimentalConversations,
    ExperimentalUtterances,
}

impl SpeechModel {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        match raw.trim() {
            "default" => Ok(SpeechModel::Default),
            "phone_call" => Ok(SpeechModel::PhoneCall),
            "numbers_and_commands" => Ok(SpeechModel::NumbersAndCommands),
            "experimental_conversations" => Ok(SpeechModel::ExperimentalConversations),
            "experimental_utterances" => Ok(SpeechModel::ExperimentalUtterances),
            other => Err(ValidationError::InvalidSpeechModel(other.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SpeechModel::Default => "default",
            SpeechModel::PhoneCall => "phone_call",
            SpeechModel::NumbersAndCommands => "numbers_and_commands",
            SpeechModel::ExperimentalConversations => "experimental_conversations",
            SpeechModel::ExperimentalUtterances => "experimental_utterances",
        }
    }
}

/// Unvalidated session creation payload, as posted by the dashboard
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SessionDraft {
    pub persona: String,
    pub greeting: String,
    pub opening_question: String,
    pub guardrails: String,
    pub closing_strategy: String,
    pub voice: Option<String>,
    pub language: Option<String>,
    pub speech_model: Option<String>,
    pub temperature: Option<f32>,
    pub to: String,
    pub customer_name: Option<String>,
    pub company: Option<String>,
    pub campaign: Option<String>,
}

/// Immutable configuration captured when the session is created
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionConfig {
    pub persona: String,
    pub greeting: String,
    pub opening_question: String,
    pub guardrails: String,
    pub closing_strategy: String,
    pub voice: Voice,
    pub language: Language,
    pub speech_model: SpeechModel,
    pub temperature: f32,
    pub to: String,
    pub customer_name: Option<String>,
    pub company: Option<String>,
    pub campaign: Option<String>,
}

impl TryFrom<SessionDraft> for SessionConfig {
    type Error = ValidationError;

    fn try_from(draft: SessionDraft) -> Result<Self, Self::Error> {
        let persona = required(draft.persona, "persona")?;
        let greeting = required(draft.greeting, "greeting")?;
        let opening_question = required(draft.opening_question, "opening_question")?;

        let to = required(draft.to, "to")?;
        if !PHONE_NUMBER.is_match(&to) {
            return Err(ValidationError::InvalidPhoneNumber(to));
        }

        let voice = Voice::parse(draft.voice.as_deref().unwrap_or(DEFAULT_VOICE))?;
        let language = Language::parse(draft.language.as_deref().unwrap_or(DEFAULT_LANGUAGE))?;
        let speech_model = draft
            .speech_model
            .as_deref()
            .map_or(Ok(SpeechModel::Default), SpeechModel::parse)?;

        let temperature = draft.temperature.unwrap_or(DEFAULT_TEMPERATURE);
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ValidationError::TemperatureOutOfRange(temperature));
        }

        Ok(Self {
            persona,
            greeting,
            opening_question,
            guardrails: draft.guardrails.trim().to_string(),
            closing_strategy: draft.closing_strategy.trim().to_string(),
            voice,
            language,
            speech_model,
            temperature,
            to,
            customer_name: label(draft.customer_name),
            company: label(draft.company),
            campaign: label(draft.campaign),
        })
    }
}

fn required(value: String, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(trimmed.to_string())
    }
}

fn label(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Speaker of a transcript turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One utterance in the transcript
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Turn {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// One outbound conversation and everything recorded about it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub session_id: String,
    pub call_id: Option<String>,
    pub config: SessionConfig,
    pub status: CallStatus,
    pub transcript: Vec<Turn>,
    pub summary: Option<String>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn has_greeting(&self) -> bool {
        self.transcript.iter().any(|t| t.role == Role::System)
    }

    /// Turns spoken by the caller or the agent, greeting excluded
    pub fn conversation_turns(&self) -> impl Iterator<Item = &Turn> {
        self.transcript.iter().filter(|t| t.role != Role::System)
    }
}
