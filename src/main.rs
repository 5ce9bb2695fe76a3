//! Re-engagement Notifier CLI
//!
//! 找出不活跃用户并通过 OneSignal 推送召回通知

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use reengage_notifier::reengagement::composer::render_all;
use reengage_notifier::{invoke, server, RuntimeConfig};

#[derive(Parser)]
#[command(name = "reengage")]
#[command(about = "Re-engagement Notifier - 找出不活跃用户并推送召回通知")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 执行一次召回，输出 JSON 结果
    Run {
        /// 配置文件路径 (默认: ~/.config/reengage/config.json)
        #[arg(long, short)]
        config: Option<PathBuf>,
        /// Dry-run 模式（只选人不发送）
        #[arg(long)]
        dry_run: bool,
    },
    /// 启动 HTTP 服务
    Serve {
        /// 监听地址
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// 监听端口
        #[arg(long, default_value = "8787")]
        port: u16,
        /// 配置文件路径
        #[arg(long, short)]
        config: Option<PathBuf>,
    },
    /// 预览所有通知文案
    Preview {
        /// 聊天名称
        #[arg(long)]
        chat_name: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // 通过 RUST_LOG 环境变量控制日志级别，默认为 info
    // 例如: RUST_LOG=debug reengage run
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("reengage_notifier=info,reengage=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, dry_run } => {
            let mut config = RuntimeConfig::load(config.as_deref())?;
            if dry_run {
                config.dry_run = true;
            }

            let response = invoke(&config, Utc::now()).await;
            println!("{}", serde_json::to_string_pretty(&response)?);
            if !response.is_success() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Serve { host, port, config } => {
            let config = RuntimeConfig::load(config.as_deref())?;
            server::serve(config, &host, port).await?;
        }
        Commands::Preview { chat_name } => {
            for (i, text) in render_all(&chat_name).iter().enumerate() {
                println!("  [{}] {}", i, text);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
