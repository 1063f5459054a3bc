use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use interviewer_core::{
    ApprovalOutcome, BreakdownEntry, Report, ReportStatus, Step, StepResult, TOTAL_QUESTIONS,
};

use super::{error_response, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    /// Parsed by hand so an unknown step is a 400 rather than a 422
    pub step: String,
    pub answer: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartResponse {
    pub conversation_id: String,
    pub question: String,
    pub current_step: Step,
    pub question_number: u32,
    pub total_questions: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase", untagged)]
pub enum AnswerResponse {
    #[serde(rename_all = "camelCase")]
    Continue {
        is_complete: bool,
        next_step: Step,
        next_question: String,
        question_number: u32,
        questions_remaining: u32,
    },
    #[serde(rename_all = "camelCase")]
    Completed {
        is_complete: bool,
        approval: ApprovalOutcome,
        report: Option<ClientReport>,
    },
}

/// The report as shown to the candidate
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientReport {
    pub title: String,
    pub report_date: DateTime<Utc>,
    pub score: ClientScore,
    pub summary: String,
    pub detailed_breakdown: Vec<BreakdownEntry>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientScore {
    pub value: f64,
    pub out_of: f64,
    pub rationale: String,
    pub visual_indicator: IndicatorView,
}

#[derive(Serialize)]
pub struct IndicatorView {
    pub label: &'static str,
    pub emoji: &'static str,
}

impl From<Report> for ClientReport {
    fn from(report: Report) -> Self {
        Self {
            title: report.title,
            report_date: report.generated_at,
            score: ClientScore {
                value: report.overall_score,
                out_of: 10.0,
                rationale: report.rationale,
                visual_indicator: IndicatorView {
                    label: report.visual_indicator.label(),
                    emoji: report.visual_indicator.emoji(),
                },
            },
            summary: report.summary,
            detailed_breakdown: report.detailed_breakdown,
        }
    }
}

pub async fn start_interview(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<StartRequest>,
) -> ApiResult<Json<StartResponse>> {
    if req.message.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "message is required".to_string()));
    }

    let started = state
        .service
        .start_interview(&id, &req.message)
        .await
        .map_err(error_response)?;

    Ok(Json(StartResponse {
        conversation_id: id,
        question: started.question,
        current_step: started.state.current_step,
        question_number: started.state.current_question_number,
        total_questions: TOTAL_QUESTIONS,
    }))
}

pub async fn submit_answer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AnswerRequest>,
) -> ApiResult<Json<AnswerResponse>> {
    let step: Step = req
        .step
        .parse()
        .map_err(|e: interviewer_core::InvariantViolation| {
            (StatusCode::BAD_REQUEST, e.to_string())
        })?;

    let result = state
        .service
        .submit_answer(&id, step, &req.answer)
        .await
        .map_err(error_response)?;

    let response = match result {
        StepResult::Continue {
            state,
            next_step,
            next_question,
            questions_remaining,
        } => AnswerResponse::Continue {
            is_complete: false,
            next_step,
            next_question,
            question_number: state.current_question_number,
            questions_remaining,
        },
        StepResult::Completed {
            report, approval, ..
        } => AnswerResponse::Completed {
            is_complete: true,
            approval,
            report: report.map(ClientReport::from),
        },
    };

    Ok(Json(response))
}

pub async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ClientReport>> {
    match state.service.report(&id).map_err(error_response)? {
        ReportStatus::Published(report) => Ok(Json(report.into())),
        ReportStatus::InProgress => Err((
            StatusCode::CONFLICT,
            "Interview is still in progress".to_string(),
        )),
        ReportStatus::Withheld(_) => Err((
            StatusCode::FORBIDDEN,
            "Report withheld pending review".to_string(),
        )),
    }
}
