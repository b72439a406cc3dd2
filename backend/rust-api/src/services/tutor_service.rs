//! Conversational operations: questions, answers, hints and the opening question.

use std::sync::Arc;

use crate::error::ApiError;
use crate::metrics::record_mock;
use crate::models::{
    answer::{SubmitAnswerRequest, SubmitAnswerResponse},
    content::UploadedContent,
    hint::{HintReply, RequestHintRequest, RequestHintResponse},
    interaction::{Interaction, InteractionKind},
    question::{AskQuestionRequest, AskQuestionResponse, FirstQuestionResponse},
    CounterDelta, LearningSession, SessionMode,
};
use crate::services::chat_registry::ChatSessionRegistry;
use crate::services::failure::FailureClassifier;
use crate::services::gemini::{prompts, response::parse_typed, AiGateway, ChatHandle, GatewayError};
use crate::services::mock_fallback::mock_chat_reply;
use crate::services::repository::Repository;
use crate::services::AppState;

/// Learner level used for every chat until per-user levels exist.
const DEFAULT_USER_LEVEL: &str = "intermediate";

pub struct TutorService {
    repository: Arc<dyn Repository>,
    gateway: Arc<dyn AiGateway>,
    classifier: Arc<dyn FailureClassifier>,
    chats: ChatSessionRegistry,
}

impl TutorService {
    pub fn new(state: &AppState) -> Self {
        Self {
            repository: state.repository.clone(),
            gateway: state.gateway.clone(),
            classifier: state.classifier.clone(),
            chats: state.chats.clone(),
        }
    }

    async fn load_session(&self, session_id: &str) -> Result<LearningSession, ApiError> {
        self.repository
            .get_session(session_id)
            .await?
            .ok_or(ApiError::SessionNotFound)
    }

    async fn chat_for(&self, session_id: &str, context: String) -> Result<ChatHandle, GatewayError> {
        let gateway = self.gateway.clone();
        self.chats
            .get_or_create(session_id, || async move {
                gateway
                    .start_interactive_session(&context, DEFAULT_USER_LEVEL)
                    .await
            })
            .await
    }

    async fn converse(
        &self,
        session_id: &str,
        context: String,
        message: &str,
    ) -> Result<String, GatewayError> {
        let chat = self.chat_for(session_id, context).await?;
        self.gateway.send_message(Some(&chat), message).await
    }

    async fn bump(&self, session_id: &str, delta: CounterDelta) -> Result<(), ApiError> {
        if !self.repository.increment_counters(session_id, delta).await? {
            return Err(ApiError::SessionNotFound);
        }
        Ok(())
    }

    pub async fn ask_question(&self, req: AskQuestionRequest) -> Result<AskQuestionResponse, ApiError> {
        let session = self.load_session(&req.session_id).await?;
        let latest = self.repository.latest_completed_upload(&session.id).await?;
        let context = chat_context(&session, latest.as_ref(), &req.context);

        let (response, is_mock) = match self.converse(&session.id, context, &req.question).await {
            Ok(reply) => (reply, None),
            Err(err) => {
                let failure = self.classifier.classify(&err);
                if !failure.is_transient() {
                    tracing::warn!("Question for session {} failed: {}", session.id, err);
                    return Err(failure.into());
                }
                tracing::warn!(
                    "Serving demo reply for session {} ({:?})",
                    session.id,
                    failure.category
                );
                record_mock("ask");
                let reply = match latest.as_ref() {
                    Some(upload) => mock_chat_reply(&upload.key_concepts, &stored_summary(upload)),
                    None => mock_chat_reply(&[], ""),
                };
                (reply, Some(true))
            }
        };

        let interaction = Interaction::new(
            &session.id,
            InteractionKind::Question,
            req.question,
            response.clone(),
            req.context,
        );
        self.repository.insert_interaction(&interaction).await?;
        self.bump(&session.id, CounterDelta::question()).await?;

        Ok(AskQuestionResponse {
            success: true,
            response,
            interaction_id: interaction.id,
            is_mock,
        })
    }

    pub async fn submit_answer(
        &self,
        req: SubmitAnswerRequest,
    ) -> Result<SubmitAnswerResponse, ApiError> {
        let session = self.load_session(&req.session_id).await?;
        let context = serde_json::to_string(&req.context).unwrap_or_default();

        let evaluation = self
            .gateway
            .evaluate_answer(&req.question, &req.user_answer, &req.correct_answer, &context)
            .await
            .map_err(|err| ApiError::from(self.classifier.classify(&err)))?;

        let interaction = Interaction::new(
            &session.id,
            InteractionKind::Answer,
            req.question,
            evaluation.feedback.clone(),
            req.context,
        )
        .with_answer(req.user_answer, evaluation.is_correct);
        self.repository.insert_interaction(&interaction).await?;

        if evaluation.is_correct {
            self.bump(&session.id, CounterDelta::correct_answer()).await?;
        }
        tracing::info!(
            "Answer evaluated for session {}: correct={} ({}%)",
            session.id,
            evaluation.is_correct,
            evaluation.correctness_percentage
        );

        Ok(SubmitAnswerResponse {
            success: true,
            evaluation,
            interaction_id: interaction.id,
        })
    }

    pub async fn request_hint(&self, req: RequestHintRequest) -> Result<RequestHintResponse, ApiError> {
        let session = self.load_session(&req.session_id).await?;
        let prompt = prompts::hint_request(&req.problem, &req.current_progress);

        let reply: HintReply = async {
            let text = self
                .converse(&session.id, mode_context(session.mode), &prompt)
                .await?;
            parse_typed::<HintReply>(&text)
        }
        .await
        .map_err(|err| ApiError::from(self.classifier.classify(&err)))?;

        let interaction = Interaction::new(
            &session.id,
            InteractionKind::Hint,
            prompt,
            reply.hint.clone(),
            serde_json::json!({ "problem": req.problem }),
        );
        self.repository.insert_interaction(&interaction).await?;
        self.bump(&session.id, CounterDelta::hint()).await?;

        Ok(RequestHintResponse {
            success: true,
            hint: reply.hint,
            encouragement: reply.encouragement,
        })
    }

    /// Opening Socratic question. Falls back to a canned question on any failure.
    pub async fn first_question(&self, session_id: &str) -> Result<FirstQuestionResponse, ApiError> {
        let session = self.load_session(session_id).await?;
        let latest = self.repository.latest_completed_upload(&session.id).await?;
        let context = chat_context(&session, latest.as_ref(), &serde_json::json!({}));
        let prompt = prompts::first_question(session.mode.display_name());

        let generated = self.converse(&session.id, context, &prompt).await;

        match generated {
            Ok(question) if !question.trim().is_empty() => Ok(FirstQuestionResponse {
                success: true,
                question: question.trim().to_string(),
                is_fallback: false,
            }),
            Ok(_) => Ok(fallback_question(session.mode)),
            Err(err) => {
                tracing::warn!(
                    "Opening question for session {} fell back: {}",
                    session.id,
                    err
                );
                Ok(fallback_question(session.mode))
            }
        }
    }
}

fn mode_context(mode: SessionMode) -> String {
    format!("Session Mode: {}", mode.display_name())
}

fn pretty(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// System context for a session's chat. Without an analyzed upload the
/// direct-chat variant is used, which carries no analysis data.
pub fn chat_context(
    session: &LearningSession,
    latest: Option<&UploadedContent>,
    extra: &serde_json::Value,
) -> String {
    match latest.and_then(|upload| upload.analysis()) {
        Some(analysis) => format!(
            "{}\nContent Analysis: {}\nAdditional Context: {}",
            mode_context(session.mode),
            pretty(&analysis),
            pretty(extra)
        ),
        None => format!(
            "{}\nDirect chat session: no file has been uploaded yet. \
             Answer from general knowledge and invite the learner to share material.\n\
             Additional Context: {}",
            mode_context(session.mode),
            pretty(extra)
        ),
    }
}

fn stored_summary(upload: &UploadedContent) -> String {
    upload
        .analysis()
        .and_then(|analysis| {
            ["summary", "analysis", "problem_type"]
                .iter()
                .find_map(|key| analysis.get(*key).and_then(|v| v.as_str()).map(str::to_string))
        })
        .unwrap_or_default()
}

pub fn fallback_question(mode: SessionMode) -> FirstQuestionResponse {
    let question = match mode {
        SessionMode::Video => {
            "Now that the video has been analyzed, what do you remember as its most important point?"
        }
        SessionMode::Problem => {
            "Before I guide you, tell me: where would you start to solve this problem?"
        }
        SessionMode::Document => {
            "Now that I have gone through this document, what main ideas do you take from it?"
        }
        SessionMode::Creative => "Can you explain what you were trying to express in this work?",
    };
    FirstQuestionResponse {
        success: true,
        question: question.to_string(),
        is_fallback: true,
    }
}
