//! Terminal drivers for each command.

use std::error::Error;
use std::io;
use std::path::PathBuf;

use prep_core::model::{CategoryKind, ResultItems, ResultSummary};
use services::{
    AppServices, ClipFileDevice, InterviewStep, QuizOutcome, QuizStep, SessionError,
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

type CommandResult = Result<(), Box<dyn Error>>;

/// Line-oriented prompt over stdin.
struct Console {
    lines: Lines<BufReader<Stdin>>,
}

impl Console {
    fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// `None` on end of input.
    async fn prompt(&mut self, text: &str) -> io::Result<Option<String>> {
        println!("{text}");
        Ok(self
            .lines
            .next_line()
            .await?
            .map(|line| line.trim().to_owned()))
    }
}

// ─── quiz ───────────────────────────────────────────────────────────────────

pub async fn quiz(services: &AppServices, kind: CategoryKind, name: &str) -> CommandResult {
    let loop_svc = services.session_loop();
    let mut session = loop_svc.start_quiz(kind, name).await?;
    let mut console = Console::new();
    println!(
        "{} quiz: {} questions",
        session.category().name,
        session.questions().len()
    );

    loop {
        let Some(question) = session.current_question() else {
            return Ok(());
        };
        let selected = session.selected(question.id()).map(str::to_owned);
        println!();
        println!(
            "Question {}/{}: {}",
            session.current_index() + 1,
            session.questions().len(),
            question.prompt()
        );
        for (idx, option) in question.options().iter().enumerate() {
            let marker = if selected.as_deref() == Some(option.as_str()) {
                '*'
            } else {
                ' '
            };
            println!(" {marker} {}. {option}", idx + 1);
        }
        let options = question.options().to_vec();

        let Some(input) = console
            .prompt("[number] select  [n]ext  [p]revious  [f]inish  [q]uit")
            .await?
        else {
            return Ok(());
        };

        let step = match input.as_str() {
            "n" | "" => loop_svc.advance_quiz(&mut session).await,
            "p" => session.previous().map(QuizStep::Moved),
            "f" => loop_svc.finish_quiz(&mut session).await.map(QuizStep::Finished),
            "q" => return Ok(()),
            raw => match raw.parse::<usize>().ok().and_then(|n| options.get(n.wrapping_sub(1))) {
                Some(option) => loop_svc
                    .select_option(&mut session, option)
                    .map(|()| QuizStep::Moved(session.current_index())),
                None => {
                    println!("Pick an option between 1 and {}.", options.len());
                    continue;
                }
            },
        };

        match step {
            Ok(QuizStep::Moved(_)) => {}
            Ok(QuizStep::Finished(outcome)) => {
                print_quiz_outcome(&outcome);
                return Ok(());
            }
            Err(err) => report_session_error(&err),
        }
    }
}

fn print_quiz_outcome(outcome: &QuizOutcome) {
    print_summary(&outcome.summary);
    let attempts = outcome.attempts;
    if attempts.already_attempted > 0 || attempts.failed > 0 {
        println!(
            "Attempts recorded: {}, already attempted: {}, not recorded: {}",
            attempts.recorded, attempts.already_attempted, attempts.failed
        );
    }
}

// ─── interview ──────────────────────────────────────────────────────────────

pub async fn interview(services: &AppServices, role: &str, clips: Vec<PathBuf>) -> CommandResult {
    let loop_svc = services.session_loop();
    let mut session = loop_svc.start_interview(role).await?;
    let mut device = ClipFileDevice::new(clips);
    let mut console = Console::new();
    println!(
        "{} interview: {} questions",
        session.role(),
        session.questions().len()
    );

    loop {
        let Some(question) = session.current_question() else {
            return Ok(());
        };
        println!();
        println!(
            "Question {}/{}: {}",
            session.current_index() + 1,
            session.questions().len(),
            question.prompt()
        );
        let is_answered = session.evaluation(question.id()).is_some();

        if !is_answered {
            let Some(input) = console.prompt("[Enter] start recording  [q]uit").await? else {
                return Ok(());
            };
            if input == "q" {
                return Ok(());
            }
            if let Err(err) = loop_svc.start_recording(&mut session, &mut device).await {
                report_session_error(&err);
                continue;
            }

            let Some(input) = console.prompt("Recording... [Enter] stop and submit  [c]ancel").await?
            else {
                loop_svc.cancel_recording(&mut session, &mut device).await?;
                return Ok(());
            };
            if input == "c" {
                loop_svc.cancel_recording(&mut session, &mut device).await?;
                continue;
            }
            match loop_svc.stop_and_submit(&mut session, &mut device).await {
                Ok(evaluation) => {
                    println!("Transcript: {}", evaluation.transcript);
                    println!("Score: {}", evaluation.score);
                    println!("Feedback: {}", evaluation.feedback);
                    println!("Running scores: {:?}", session.running_scores());
                }
                Err(err) => {
                    report_session_error(&err);
                    continue;
                }
            }
        }

        match loop_svc.advance_interview(&mut session).await {
            Ok(InterviewStep::Moved(_)) => {}
            Ok(InterviewStep::Finished(summary)) => {
                print_summary(&summary);
                return Ok(());
            }
            Err(err) => {
                report_session_error(&err);
                let Some(input) = console.prompt("[Enter] retry finishing  [q]uit").await? else {
                    return Ok(());
                };
                if input == "q" {
                    return Ok(());
                }
            }
        }
    }
}

// ─── chat ───────────────────────────────────────────────────────────────────

pub async fn chat(services: &AppServices, query: Option<String>) -> CommandResult {
    let mut assistant = services.new_assistant();

    if let Some(query) = query {
        let reply = assistant.ask(&query).await?;
        println!("{}", reply.content);
        print_sources(&assistant);
        return Ok(());
    }

    let mut console = Console::new();
    while let Some(input) = console.prompt("You (empty line to quit):").await? {
        if input.is_empty() {
            break;
        }
        match assistant.ask(&input).await {
            Ok(reply) => {
                println!("Assistant: {}", reply.content);
                print_sources(&assistant);
            }
            Err(err) => eprintln!("{err}"),
        }
    }
    Ok(())
}

fn print_sources(assistant: &services::StudyAssistant) {
    for source in assistant.sources() {
        println!(
            "  source: {} / {} ({}% match, {:.0}% accuracy)",
            source.subject,
            source.topic,
            source.match_percent(),
            source.accuracy
        );
    }
}

// ─── report ─────────────────────────────────────────────────────────────────

pub async fn report(services: &AppServices) -> CommandResult {
    let view = services.reports().load().await;
    if let Some(notice) = &view.notice {
        println!("{notice}");
        return Ok(());
    }
    let report = &view.report;
    if report.is_empty() {
        println!("No activity yet. Take a quiz or an interview to build your report.");
        return Ok(());
    }

    println!("Average score by category:");
    for (kind, average) in report.kind_averages() {
        println!("  {:<8} {average}%", kind.as_str());
    }

    println!("Progress over time:");
    for point in report.timeline() {
        println!("  {} {:<30} {}", point.date, point.label, point.score);
    }

    if !report.subject_bars.is_empty() {
        println!("Subjects:");
        for bar in &report.subject_bars {
            println!("  {:<20} {:.1}", bar.subject, bar.average_score);
        }
    }

    let attempts = report.attempts;
    println!(
        "Quiz attempts: {} total, {} correct ({:.1}% accuracy)",
        attempts.total, attempts.correct, attempts.accuracy
    );
    Ok(())
}

// ─── shared output ──────────────────────────────────────────────────────────

fn print_summary(summary: &ResultSummary) {
    println!();
    println!("Score: {} ({}%)", summary.score(), summary.percentage());
    match summary.items() {
        ResultItems::Quiz(items) => {
            for (idx, item) in items.iter().enumerate() {
                let verdict = if item.correct { "correct" } else { "incorrect" };
                println!("{}. {}", idx + 1, item.prompt);
                println!("   your answer: {} ({verdict})", item.selected_label());
                if let Some(answer) = &item.correct_answer {
                    println!("   correct answer: {answer}");
                }
            }
        }
        ResultItems::Interview(items) => {
            for (idx, item) in items.iter().enumerate() {
                println!("{}. {} [{}]", idx + 1, item.prompt, item.score);
                println!("   {}", item.feedback);
            }
        }
    }
}

fn report_session_error(err: &SessionError) {
    eprintln!("{err}");
    if err.is_retryable() {
        eprintln!("Nothing was lost; try again.");
    }
}
