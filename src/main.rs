use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use deepsearch_rs::cli::Args;
use deepsearch_rs::generator::outlet::save_report;
use deepsearch_rs::{
    LLMClient, NodeContext, NodeKind, ProgressEvent, ResearchEngine, TavilyClient,
};

/// 初始化日志，`RUST_LOG`优先于`--verbose`
fn init_tracing(verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("deepsearch_rs=debug,info")
            } else {
                EnvFilter::try_new("warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .init();
}

fn print_progress(event: &ProgressEvent) {
    match event {
        ProgressEvent::Node { node, state } => {
            let paragraph = state
                .paragraphs
                .get(state.current_paragraph_index)
                .map(|p| p.title.as_str())
                .unwrap_or("-");
            match node {
                NodeKind::Structure => println!(
                    "📋 报告结构已生成: {} ({}个段落)",
                    state.report_title,
                    state.paragraphs.len()
                ),
                NodeKind::Search => println!("🔍 首次搜索: {}", paragraph),
                NodeKind::Summarize => println!("✍️ 段落初稿: {}", paragraph),
                NodeKind::ReflectSearch => println!("🤔 反思搜索: {}", paragraph),
                NodeKind::ReflectSummarize => println!("📝 反思补充: {}", paragraph),
                NodeKind::Format => println!("🖊️ 最终报告已生成"),
            }
        }
        ProgressEvent::Completed { run_time, .. } => {
            println!("✓ 调研完成，耗时 {:.2}秒", run_time.as_secs_f64());
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.into_config()?;
    init_tracing(config.verbose);

    let llm_client = LLMClient::new(config.llm.clone())?;
    // 启动时检查模型连接
    llm_client.check_connection().await?;
    let search_client = TavilyClient::new(config.search.clone());

    let ctx = NodeContext::new(
        Arc::new(llm_client),
        Arc::new(search_client),
        config.research.clone(),
        config.target_language,
    );
    let engine = ResearchEngine::new(ctx, args.query.clone(), args.context_value());

    if !args.json {
        println!("🚀 开始深度调研: {}", args.query);
    }

    let mut events = Box::pin(engine.stream());
    let mut final_report = None;
    while let Some(event) = events.next().await {
        let event = event.context("深度调研流程执行失败")?;
        if args.json {
            println!("{}", serde_json::to_string(&event)?);
        } else {
            print_progress(&event);
        }
        if let ProgressEvent::Completed { report, .. } = event {
            final_report = Some(report);
        }
    }

    let Some(report) = final_report else {
        anyhow::bail!("深度调研流程未产出报告");
    };

    if config.save_report {
        let path = save_report(&config.output_dir, &args.query, &report)?;
        if !args.json {
            println!("💾 已保存报告: {}", path.display());
        }
    } else if !args.json {
        println!("\n{}", report);
    }

    Ok(())
}
