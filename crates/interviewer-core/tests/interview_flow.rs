mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use interviewer_core::{
    ApprovalOutcome, ConversationStatus, ExperienceLevel, InterviewError, InterviewService,
    InvariantViolation, ReportStatus, Role, Step, StepResult, VisualIndicator, TOTAL_QUESTIONS,
};

async fn answer_all(service: &InterviewService, id: &str) -> StepResult {
    let mut last = None;
    for step in Step::SEQUENCE {
        let result = service
            .submit_answer(id, step, &format!("My answer for {}", step))
            .await
            .unwrap();
        last = Some(result);
    }
    last.unwrap()
}

#[tokio::test]
async fn test_full_interview_runs_six_steps() {
    let oracle = Arc::new(ScriptedOracle::with_scores(&[8.0, 8.0, 8.0, 8.0, 8.0, 8.0]));
    let service = service(oracle.clone());
    let conversation = service.create_conversation("sam@example.com").unwrap();

    let started = service
        .start_interview(&conversation.id, OPENING)
        .await
        .unwrap();
    assert_eq!(started.question, "Question #1");
    assert_eq!(started.state.current_step, Step::Intro);
    assert_eq!(started.state.current_question_number, 1);
    assert_eq!(
        started.state.candidate_info.experience_level,
        ExperienceLevel::Intermediate
    );
    assert_eq!(started.state.candidate_info.name.as_deref(), Some("Candidate"));

    let expected_remaining = [4, 3, 2, 1, 0];
    for (i, step) in Step::SEQUENCE.iter().take(5).enumerate() {
        let result = service
            .submit_answer(&conversation.id, *step, "An answer")
            .await
            .unwrap();
        match result {
            StepResult::Continue {
                state,
                next_step,
                next_question,
                questions_remaining,
            } => {
                assert_eq!(Some(next_step), step.next());
                assert_eq!(state.current_step, next_step);
                assert_eq!(state.current_question_number, i as u32 + 2);
                assert_eq!(questions_remaining, expected_remaining[i]);
                assert_eq!(next_question, format!("Question #{}", i + 2));
                assert_eq!(state.completed_steps.len(), i + 1);
            }
            other => panic!("expected to continue, got {:?}", other),
        }
    }

    let result = service
        .submit_answer(&conversation.id, Step::Advanced3, "Last answer")
        .await
        .unwrap();
    let StepResult::Completed {
        state,
        report,
        approval,
    } = result
    else {
        panic!("expected completion");
    };

    assert!(state.is_complete);
    assert_eq!(state.current_question_number, TOTAL_QUESTIONS + 1);
    assert_eq!(state.qa_pairs.len(), 6);
    assert_eq!(state.completed_steps, Step::SEQUENCE.to_vec());
    assert_eq!(approval, ApprovalOutcome::Approved);

    let report = report.unwrap();
    assert_eq!(report.overall_score, 8.0);
    assert_eq!(report.visual_indicator, VisualIndicator::Excellent);
    assert_eq!(state.final_results.as_ref(), Some(&report));
    assert_eq!(oracle.questions_asked(), 6);

    let stored = service.get_conversation(&conversation.id).unwrap();
    assert_eq!(stored.status, ConversationStatus::Completed);
    assert_eq!(
        service.report(&conversation.id).unwrap(),
        ReportStatus::Published(report)
    );
}

#[tokio::test]
async fn test_report_averages_step_scores() {
    let oracle = Arc::new(ScriptedOracle::with_scores(&[9.0, 7.0, 5.0, 7.0, 7.0, 7.0]));
    let service = service(oracle);
    let id = service.create_conversation("a@example.com").unwrap().id;
    service.start_interview(&id, OPENING).await.unwrap();

    let StepResult::Completed { report, .. } = answer_all(&service, &id).await else {
        panic!("expected completion");
    };
    let report = report.unwrap();
    assert!((report.overall_score - 7.0).abs() < 1e-9);
    assert_eq!(report.visual_indicator, VisualIndicator::Good);
    assert_eq!(report.detailed_breakdown.len(), 6);
    assert_eq!(report.detailed_breakdown[0].score, 9.0);
}

#[tokio::test]
async fn test_unparseable_evaluation_uses_fallback() {
    let oracle = Arc::new(ScriptedOracle::new());
    oracle.push_evaluation("I would give this a solid eight");
    let service = service(oracle);
    let id = service.create_conversation("a@example.com").unwrap().id;
    service.start_interview(&id, OPENING).await.unwrap();

    let result = service
        .submit_answer(&id, Step::Intro, "I build reports")
        .await
        .unwrap();
    let record = &result.state().evaluations[&Step::Intro];
    assert_eq!(record.score, 7.0);
    assert_eq!(record.feedback, "Response evaluated");
    assert_eq!(*record, interviewer_evaluator::EvaluationRecord::fallback());
}

#[tokio::test]
async fn test_generation_failure_saves_nothing() {
    let oracle = Arc::new(ScriptedOracle::with_scores(&[6.0, 6.0]));
    let service = service(oracle.clone());
    let id = service.create_conversation("a@example.com").unwrap().id;
    service.start_interview(&id, OPENING).await.unwrap();

    oracle.fail_next_questions(1);
    let err = service
        .submit_answer(&id, Step::Intro, "My answer")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        InterviewError::QuestionGeneration {
            step: Step::Theory,
            ..
        }
    ));

    let state = service.store().load(&id).unwrap();
    assert_eq!(state.current_step, Step::Intro);
    assert_eq!(state.current_question_number, 1);
    assert!(state.qa_pairs.is_empty());
    assert!(state.evaluations.is_empty());
    assert!(state.completed_steps.is_empty());

    // Retrying the same step succeeds once the oracle recovers
    let result = service
        .submit_answer(&id, Step::Intro, "My answer")
        .await
        .unwrap();
    assert_eq!(result.state().current_step, Step::Theory);
    assert_eq!(result.state().qa_pairs.len(), 1);
}

#[tokio::test]
async fn test_start_failure_saves_nothing() {
    let oracle = Arc::new(ScriptedOracle::new());
    let service = service(oracle.clone());
    let id = service.create_conversation("a@example.com").unwrap().id;

    oracle.fail_next_questions(1);
    let err = service.start_interview(&id, OPENING).await.unwrap_err();
    assert!(matches!(err, InterviewError::QuestionGeneration { step: Step::Intro, .. }));
    assert!(service.get_conversation(&id).unwrap().state.is_none());

    service.start_interview(&id, OPENING).await.unwrap();
}

#[tokio::test]
async fn test_wrong_step_is_rejected() {
    let service = service(Arc::new(ScriptedOracle::new()));
    let id = service.create_conversation("a@example.com").unwrap().id;
    service.start_interview(&id, OPENING).await.unwrap();

    let err = service
        .submit_answer(&id, Step::Practical, "skipping ahead")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        InterviewError::Invariant(InvariantViolation::StepMismatch {
            expected: Step::Intro,
            submitted: Step::Practical,
        })
    ));

    service.submit_answer(&id, Step::Intro, "ok").await.unwrap();
    let err = service.submit_answer(&id, Step::Intro, "again").await.unwrap_err();
    assert!(matches!(
        err,
        InterviewError::Invariant(InvariantViolation::DuplicateStep(Step::Intro))
    ));
}

#[tokio::test]
async fn test_completed_interview_rejects_answers() {
    let service = service(Arc::new(ScriptedOracle::new()));
    let id = service.create_conversation("a@example.com").unwrap().id;
    service.start_interview(&id, OPENING).await.unwrap();
    answer_all(&service, &id).await;

    let err = service
        .submit_answer(&id, Step::Advanced3, "one more")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        InterviewError::Invariant(InvariantViolation::InterviewComplete)
    ));
}

#[tokio::test]
async fn test_missing_conversations() {
    let service = service(Arc::new(ScriptedOracle::new()));

    let err = service
        .submit_answer("nope", Step::Intro, "hi")
        .await
        .unwrap_err();
    assert!(matches!(err, InterviewError::NotFound(id) if id == "nope"));

    let err = service.start_interview("nope", OPENING).await.unwrap_err();
    assert!(matches!(err, InterviewError::NotFound(_)));

    let id = service.create_conversation("a@example.com").unwrap().id;
    let err = service.submit_answer(&id, Step::Intro, "hi").await.unwrap_err();
    assert!(matches!(err, InterviewError::NotStarted(_)));

    service.start_interview(&id, OPENING).await.unwrap();
    let err = service.start_interview(&id, OPENING).await.unwrap_err();
    assert!(matches!(err, InterviewError::AlreadyStarted(_)));
}

#[tokio::test]
async fn test_rejected_report_is_withheld() {
    let service = service_with_gate(
        Arc::new(ScriptedOracle::new()),
        Arc::new(RejectingGate),
        Duration::from_secs(5),
    );
    let id = service.create_conversation("a@example.com").unwrap().id;
    service.start_interview(&id, OPENING).await.unwrap();

    let StepResult::Completed {
        state,
        report,
        approval,
    } = answer_all(&service, &id).await
    else {
        panic!("expected completion");
    };

    assert!(report.is_none());
    assert!(state.is_complete);
    assert!(state.final_results.is_none());
    assert_eq!(
        approval,
        ApprovalOutcome::Rejected {
            reason: "Scores need a second look".to_string()
        }
    );
    assert!(matches!(
        service.report(&id).unwrap(),
        ReportStatus::Withheld(ApprovalOutcome::Rejected { .. })
    ));
    assert!(state.check_invariants().is_ok());
}

#[tokio::test]
async fn test_gate_error_releases_results() {
    let service = service_with_gate(
        Arc::new(ScriptedOracle::new()),
        Arc::new(FailingGate),
        Duration::from_secs(5),
    );
    let id = service.create_conversation("a@example.com").unwrap().id;
    service.start_interview(&id, OPENING).await.unwrap();

    let StepResult::Completed {
        report, approval, ..
    } = answer_all(&service, &id).await
    else {
        panic!("expected completion");
    };

    assert!(report.is_some());
    assert!(matches!(
        approval,
        ApprovalOutcome::BypassedDueToError { ref error } if error.contains("offline")
    ));
}

#[tokio::test]
async fn test_gate_timeout_releases_results() {
    let service = service_with_gate(
        Arc::new(ScriptedOracle::new()),
        Arc::new(SlowGate),
        Duration::from_millis(50),
    );
    let id = service.create_conversation("a@example.com").unwrap().id;
    service.start_interview(&id, OPENING).await.unwrap();

    let StepResult::Completed {
        state, approval, ..
    } = answer_all(&service, &id).await
    else {
        panic!("expected completion");
    };

    assert!(matches!(approval, ApprovalOutcome::BypassedDueToError { .. }));
    assert!(state.final_results.is_some());
}

#[tokio::test]
async fn test_concurrent_answers_for_one_step() {
    let service = Arc::new(service(Arc::new(ScriptedOracle::new())));
    let id = service.create_conversation("a@example.com").unwrap().id;
    service.start_interview(&id, OPENING).await.unwrap();

    let first = {
        let service = service.clone();
        let id = id.clone();
        tokio::spawn(async move { service.submit_answer(&id, Step::Intro, "first").await })
    };
    let second = {
        let service = service.clone();
        let id = id.clone();
        tokio::spawn(async move { service.submit_answer(&id, Step::Intro, "second").await })
    };

    let results = [first.await.unwrap(), second.await.unwrap()];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results.iter().any(|r| matches!(
        r,
        Err(InterviewError::Invariant(InvariantViolation::DuplicateStep(Step::Intro)))
    )));

    let state = service.store().load(&id).unwrap();
    assert_eq!(state.qa_pairs.len(), 1);
    assert_eq!(state.current_question_number, 2);
}

#[tokio::test]
async fn test_messages_record_the_exchange() {
    let service = service(Arc::new(ScriptedOracle::new()));
    let id = service.create_conversation("a@example.com").unwrap().id;
    service.start_interview(&id, OPENING).await.unwrap();
    service
        .submit_answer(&id, Step::Intro, "I model budgets")
        .await
        .unwrap();

    let state = service.store().load(&id).unwrap();
    let roles: Vec<Role> = state.messages.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
    );
    assert_eq!(state.messages[2].step, Some(Step::Intro));
    assert_eq!(state.pending_question(), Some("Question #2"));

    let summaries = service.list_conversations().unwrap();
    assert_eq!(summaries[0].message_count, 4);
    assert!(!summaries[0].interview_completed);
}
