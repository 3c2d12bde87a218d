use std::sync::Arc;

use colloquy_core::prelude::*;

#[tokio::main]
async fn main() -> colloquy_core::error::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    println!("=== Scripted Harness Run ===\n");

    let config = HarnessConfig::default();
    let mut runner = ConversationRunner::with_config("basic-shapes", config.clone());

    // Conversation 1: two turns that build a diagram incrementally
    let outcome = runner
        .run_test(
            "builds a two box diagram",
            |signals| {
                Arc::new(
                    ScriptedAgent::new(signals)
                        .with_turn(TurnScript::new().say("Drawing box A").set_canvas("A"))
                        .with_turn(
                            TurnScript::new()
                                .say("Added box B")
                                .call_tool(
                                    "update_canvas",
                                    serde_json::json!({"content": "A\nB"}),
                                    serde_json::json!({"ok": true}),
                                )
                                .set_canvas("A\nB"),
                        ),
                ) as Arc<dyn DiagramAgent>
            },
            |mut agent, check| async move {
                agent.send("Create a box labeled A").await?;
                agent.criteria(["diagram shows one box labeled A"])?;

                agent.send("Add a box labeled B below it").await?;
                agent.criteria(["diagram shows boxes A and B"])?;

                check.expect(agent.canvas().await).to_contain("B");
                Ok(())
            },
        )
        .await;
    report_outcome("builds a two box diagram", outcome);

    // Conversation 2: an expectation the scripted agent will not meet
    let outcome = runner
        .run_test(
            "connects the boxes",
            |signals| {
                Arc::new(
                    ScriptedAgent::new(signals)
                        .with_turn(TurnScript::new().say("Done").set_canvas("A\nB")),
                ) as Arc<dyn DiagramAgent>
            },
            |mut agent, check| async move {
                agent.send("Connect A to B with an arrow").await?;
                check
                    .expect(agent.canvas().await)
                    .with_description("an arrow joins the boxes")
                    .to_contain("->");
                Ok(())
            },
        )
        .await;
    report_outcome("connects the boxes", outcome);

    // Fold both conversations into the report artifacts
    let mut builder = ReportBuilder::new();
    builder.add_records(runner.into_records());
    let report = builder.build();

    let scenarios = report.scenarios();
    let scenario_passed = scenarios.iter().filter(|s| s.passed).count();
    println!();
    println!(
        "Scenario success rate: {}/{}",
        scenario_passed,
        scenarios.len()
    );
    println!(
        "Test success rate: {}/{}",
        report.summary.passed_tests, report.summary.total_tests
    );
    println!(
        "Assertion success rate: {}/{}",
        report.summary.passed_assertions, report.summary.total_assertions
    );

    report.write_artifacts(&config);
    println!(
        "Wrote {}",
        config.results_dir.join(&config.report.json_file).display()
    );
    println!(
        "Wrote {}",
        config.results_dir.join(&config.report.html_file).display()
    );

    Ok(())
}

fn report_outcome(name: &str, outcome: colloquy_core::error::Result<()>) {
    match outcome {
        Ok(()) => println!("PASS {name}"),
        Err(err) => println!("FAIL {name}: {err}"),
    }
}
