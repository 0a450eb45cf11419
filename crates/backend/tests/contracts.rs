use backend::{
    AttemptRecord, Backend, BackendError, Credentials, FinishRequest, GeneratedSet, Operation,
    RecordedAnswer, ValidationBatch,
};
use prep_core::model::{
    AudioClip, Category, ChatReply, ChatSource, Evaluation, PersonalizedReport, Question,
    QuestionId, SessionId,
};

fn qid(raw: &str) -> QuestionId {
    QuestionId::new(raw).unwrap()
}

fn session_id() -> SessionId {
    SessionId::from_parts(1_700_000_000_000, "abc123")
}

fn os_bank() -> GeneratedSet {
    let options = ["fork", "exec", "wait"].map(String::from).to_vec();
    GeneratedSet {
        title: None,
        questions: vec![
            Question::multiple_choice(qid("os-1"), "Which call creates a process?", options)
                .unwrap(),
        ],
    }
}

#[tokio::test]
async fn quiz_contracts_share_one_adapter() {
    let (backend, memory) = Backend::in_memory(Credentials::with_token("t"));
    let os = Category::subject("Operating Systems");
    memory.add_question_bank(&os, os_bank());
    memory.set_correct_answer(qid("os-1"), "fork");

    let set = backend.generator.generate(&Category::subject("operating systems")).await.unwrap();
    assert_eq!(set.questions.len(), 1);

    let verdicts = backend
        .grader
        .validate_answers(&ValidationBatch {
            category: os.clone(),
            answers: vec![(qid("os-1"), Some("exec".into()))],
        })
        .await
        .unwrap();
    let verdict = &verdicts[&qid("os-1")];
    assert!(!verdict.correct);
    assert_eq!(verdict.correct_answer.as_deref(), Some("fork"));

    let attempt = AttemptRecord {
        question_id: qid("os-1"),
        selected: "exec".into(),
        category: os,
    };
    backend.grader.record_attempt(&attempt).await.unwrap();
    let err = backend.grader.record_attempt(&attempt).await.unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(memory.attempts(), vec![attempt]);
}

#[tokio::test]
async fn interview_total_comes_from_the_evaluator() {
    let (backend, memory) = Backend::in_memory(Credentials::with_token("t"));
    memory.push_evaluation(Evaluation {
        transcript: "I would shard by tenant.".into(),
        score: 8.0,
        feedback: "Concrete.".into(),
    });
    memory.set_finish_total(42.0);

    let evaluation = backend
        .evaluator
        .submit_answer(&RecordedAnswer {
            clip: AudioClip::webm(vec![7; 8]),
            question_text: "How would you scale writes?".into(),
            index: 0,
            role: "Backend Engineer".into(),
            session_id: session_id(),
        })
        .await
        .unwrap();
    assert_eq!(evaluation.score, 8.0);

    let total = backend
        .evaluator
        .finish_interview(&FinishRequest {
            role: "Backend Engineer".into(),
            scores: vec![8.0, 3.0, 5.0],
            session_id: session_id(),
        })
        .await
        .unwrap();
    assert_eq!(total, 42.0);
    assert_eq!(memory.finish_requests().len(), 1);
}

#[tokio::test]
async fn chat_and_report_require_a_token() {
    let credentials = Credentials::anonymous();
    let (backend, memory) = Backend::in_memory(credentials.clone());

    assert!(matches!(
        backend.chat.ask("joins").await,
        Err(BackendError::Unauthenticated)
    ));
    assert!(matches!(
        backend.reports.personalized_report().await,
        Err(BackendError::Unauthenticated)
    ));
    assert_eq!(memory.calls(Operation::Chat), 0);

    credentials.sign_in("t");
    memory.push_chat_reply(ChatReply {
        answer: "Review inner joins.".into(),
        sources: vec![ChatSource {
            subject: "DBMS".into(),
            topic: "Joins".into(),
            accuracy: 40.0,
            similarity: 0.873,
        }],
    });
    let reply = backend.chat.ask("joins").await.unwrap();
    assert_eq!(reply.sources[0].match_percent(), 87);
    assert_eq!(
        backend.reports.personalized_report().await.unwrap(),
        PersonalizedReport::default()
    );
    assert_eq!(memory.calls(Operation::Chat), 1);
}
