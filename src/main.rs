//! bee-tools 命令行入口
//!
//! 初始化日志、加载配置、构建工具执行器；`run` 以 Agent 同样的方式调用单个工具并打印结果字符串。

use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use bee_tools::{core::create_toolbox_builder, observability};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bee-tools", version, about = "Agent tools: file search, file analysis, JSON patching")]
struct Cli {
    /// 额外的配置文件（覆盖 config/default.toml）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 列出已注册的工具及说明
    List,
    /// 输出工具参数 JSON Schema
    Schema,
    /// 调用一个工具；input 为 "-" 时从 stdin 读取
    Run {
        tool: String,
        input: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();
    let cli = Cli::parse();

    let executor = create_toolbox_builder(cli.config).build_executor()?;

    match cli.command {
        Commands::List => {
            for (name, description) in executor.tool_descriptions() {
                let summary = description.lines().next().unwrap_or_default();
                println!("{:<28} {}", name, summary);
            }
        }
        Commands::Schema => println!("{}", executor.schema_json()),
        Commands::Run { tool, input } => {
            let input = if input == "-" {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .context("Failed to read tool input from stdin")?;
                buf
            } else {
                input
            };
            println!("{}", executor.run(&tool, &input).await);
        }
    }

    Ok(())
}
