//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::QuestionSet;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    GenerateQuiz {
        topic: String,
        #[serde(default)]
        difficulty: Option<String>,
    },
    Feedback {
        score: u32,
        total: u32,
        topic: String,
        #[serde(default)]
        difficulty: Option<String>,
    },
    ClearCache,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Quiz {
        quiz: QuestionSet,
    },
    Feedback {
        text: String,
    },
    CacheCleared {
        cleared: usize,
    },
    Error {
        message: String,
    },
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct QuizIn {
    pub topic: String,
    #[serde(default)]
    pub difficulty: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackIn {
    pub score: u32,
    pub total: u32,
    pub topic: String,
    #[serde(default)]
    pub difficulty: Option<String>,
}
#[derive(Serialize)]
pub struct FeedbackOut {
    pub text: String,
}

#[derive(Serialize)]
pub struct CacheClearedOut {
    pub cleared: usize,
}

#[derive(Serialize)]
pub struct TopicsOut {
    pub topics: Vec<&'static str>,
}

#[derive(Serialize)]
pub struct DifficultyOut {
    pub level: &'static str,
    pub label: &'static str,
    pub description: &'static str,
}

#[derive(Serialize)]
pub struct AiHealthOut {
    pub backend: String,
    pub ok: bool,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
