use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use haqooq_client::{completion_event, AnswerClient, AnswerService};
use haqooq_config::{Config, ConfigManager, LogLevel, LoggingConfig, CONFIG_ENV, ENDPOINT_ENV};
use haqooq_core::{Composer, Message, PendingRequest, Session, Trigger, TriggerOutcome};
use haqooq_observability::{request_span, LogManager, LogSink};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, Instrument};

#[derive(Parser)]
#[command(name = "haqooq")]
#[command(about = "Command line client for the HaqooqAI legal assistant")]
#[command(version)]
struct Cli {
    /// Answer service endpoint (overrides the config file)
    #[arg(long, env = ENDPOINT_ENV)]
    endpoint: Option<String>,

    /// Enable debug mode
    #[arg(long, short, default_value = "false")]
    debug: bool,

    /// Config file path
    #[arg(long, env = CONFIG_ENV, default_value = "~/.haqooq/config.json")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 启动交互式问答（行尾加 \ 续行）
    Chat,
    /// 提问一次并打印回答
    Ask {
        /// 问题内容
        #[arg(trailing_var_arg = true)]
        query: Vec<String>,
    },
    /// 配置管理命令
    Config(ConfigArgs),
}

#[derive(Args, Clone)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// 获取配置值
    Get {
        /// 配置键 (如: endpoint.url, ui.title, logging.level)
        key: String,
    },
    /// 设置配置值
    Set {
        /// 配置键 (如: endpoint.url, ui.title, logging.level)
        key: String,
        /// 配置值
        value: String,
    },
    /// 初始化默认配置
    Init {
        /// 强制覆盖已有配置
        #[arg(long, default_value = "false")]
        force: bool,
    },
    /// 显示当前配置
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 命令行模式日志写 stderr，默认只输出警告
    let logging = LoggingConfig {
        level: if cli.debug { LogLevel::Debug } else { LogLevel::Warn },
        file: None,
    };
    let _log_manager = LogManager::init(&logging, LogSink::Stderr)?;

    let config_path = haqooq_config::expand_tilde(&cli.config)
        .unwrap_or_else(|| PathBuf::from(&cli.config));

    if cli.debug {
        eprintln!("{}", format!("[DEBUG] Config path: {:?}", config_path).dimmed());
    }

    match cli.command {
        Commands::Chat => {
            let config = load_config(&config_path, cli.endpoint).await?;
            run_interactive_chat(&config, cli.debug).await
        }
        Commands::Ask { query } => {
            let config = load_config(&config_path, cli.endpoint).await?;
            ask_once(&config, &query.join(" "), cli.debug).await
        }
        Commands::Config(args) => handle_config(args, config_path).await,
    }
}

async fn load_config(path: &Path, endpoint: Option<String>) -> anyhow::Result<Config> {
    let manager = ConfigManager::load(path).await?;
    let config = manager.snapshot().await.with_endpoint_override(endpoint);
    haqooq_config::validate_url(&config.endpoint.url)?;
    Ok(config)
}

async fn handle_config(args: ConfigArgs, config_path: PathBuf) -> anyhow::Result<()> {
    match args.command {
        ConfigCommands::Get { key } => {
            let manager = ConfigManager::load(&config_path).await?;
            let config = manager.snapshot().await;

            match config.get_value(&key) {
                Some(value) => {
                    println!("{}", format!("{} = {}", key, value).green());
                }
                None => {
                    println!("{}", format!("❌ Key not found: {}", key).red());
                    std::process::exit(1);
                }
            }
        }
        ConfigCommands::Set { key, value } => {
            let manager = ConfigManager::load(&config_path).await?;

            if let Err(e) = manager
                .update(|config| config.set_value(&key, &value))
                .await
            {
                eprintln!("{}", format!("❌ Failed to set value: {}", e).red());
                std::process::exit(1);
            }

            println!("{}", format!("✅ Set {} = {}", key, value).green());
        }
        ConfigCommands::Init { force } => {
            if config_path.exists() && !force {
                println!("{}", format!("⚠️  Config already exists at {:?}", config_path).yellow());
                println!("{}", "Use --force to overwrite".dimmed());
                return Ok(());
            }

            // 初始化目录
            haqooq_config::init_haqooq_dirs().await?;

            let manager = ConfigManager::new(Config::default(), config_path.clone());
            manager.save().await?;

            println!("{}", format!("✅ Config initialized at {:?}", config_path).green());
            println!("{}", "You can edit this file to customize your settings".dimmed());
        }
        ConfigCommands::Show => {
            let manager = ConfigManager::load(&config_path).await?;
            let config = manager.snapshot().await;

            println!("{}", "📋 Current Configuration:".cyan().bold());
            println!();

            // 显示为 JSON
            let json = serde_json::to_string_pretty(&config)?;
            println!("{}", json);
        }
    }

    Ok(())
}

/// 发出请求并把结果交给会话；返回新追加的助手消息
async fn round_trip<'s>(
    service: &dyn AnswerService,
    session: &'s mut Session,
    request: PendingRequest,
    debug: bool,
) -> anyhow::Result<&'s Message> {
    let span = request_span(&request.token.to_string());
    let start = Instant::now();
    let result = service.ask(&request.query).instrument(span).await;

    if debug {
        eprintln!(
            "{}",
            format!("[DEBUG] {} finished in {:?}", request.token, start.elapsed()).dimmed()
        );
    }

    session.apply(completion_event(request.token, result))?;
    session
        .messages()
        .last()
        .ok_or_else(|| anyhow::anyhow!("session is empty after a completed request"))
}

fn print_answer(msg: &Message) {
    let parts = msg.parts();
    println!("{}", parts.body);
    if let Some(citation) = parts.citation {
        println!("{} {}", "Source:".dimmed().bold(), citation.dimmed().italic());
    }
}

async fn ask_once(config: &Config, query: &str, debug: bool) -> anyhow::Result<()> {
    let service = AnswerClient::new(&config.endpoint.url);
    let mut session = Session::new();

    if debug {
        eprintln!("{}", format!("[DEBUG] POST {}", service.endpoint()).dimmed());
    }

    let request = match session.submit(query) {
        Ok(request) => request,
        Err(e) => {
            debug!(error = %e, "nothing to ask");
            println!("{}", "⚠️  Nothing to ask: the question is empty".yellow());
            return Ok(());
        }
    };

    let answer = round_trip(&service, &mut session, request, debug).await?;
    print_answer(answer);
    Ok(())
}

/// 把一行输入交给编辑器。以 `\` 结尾的行只换行不发送。
fn feed_line(composer: &mut Composer, session: &mut Session, line: &str) -> TriggerOutcome {
    match line.strip_suffix('\\') {
        Some(head) => {
            composer.push_str(head);
            composer.trigger(Trigger::Enter { shift: true }, session)
        }
        None => {
            composer.push_str(line);
            let outcome = composer.trigger(Trigger::Activate, session);
            if outcome == TriggerOutcome::Ignored {
                composer.clear();
            }
            outcome
        }
    }
}

async fn run_interactive_chat(config: &Config, debug: bool) -> anyhow::Result<()> {
    let service = AnswerClient::new(&config.endpoint.url);
    let mut session = Session::new();
    let mut composer = Composer::new();

    println!("{}", format!("⚖  {} - {}", config.ui.title, config.ui.subtitle).cyan().bold());
    if !config.ui.greeting.trim().is_empty() {
        println!("{}", config.ui.greeting.green());
    }
    println!("{}", "End a line with \\ to continue it. Type 'exit' or 'quit' to leave".dimmed());

    if debug {
        eprintln!("{}", format!("[DEBUG] Endpoint: {}", service.endpoint()).dimmed());
    }

    println!();

    loop {
        if composer.draft().is_empty() {
            print!("{} ", "You:".cyan().bold());
        } else {
            print!("{} ", "...".cyan());
        }
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            println!();
            break;
        }
        let line = input.trim_end_matches(['\r', '\n']);

        if composer.draft().is_empty()
            && (line.trim().eq_ignore_ascii_case("exit") || line.trim().eq_ignore_ascii_case("quit"))
        {
            println!("{}", "👋 Goodbye!".cyan());
            break;
        }

        let request = match feed_line(&mut composer, &mut session, line) {
            TriggerOutcome::Submitted(request) => request,
            TriggerOutcome::LineBreak | TriggerOutcome::Ignored => continue,
        };

        println!("{}", format!("{}:", config.ui.title).green().bold());
        let answer = round_trip(&service, &mut session, request, debug).await?;
        print_answer(answer);
        println!();
    }

    debug!(messages = session.len(), "chat finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_line_submits() {
        let mut composer = Composer::new();
        let mut session = Session::new();

        match feed_line(&mut composer, &mut session, "What is Section 302 PPC?") {
            TriggerOutcome::Submitted(request) => {
                assert_eq!(request.query, "What is Section 302 PPC?");
            }
            other => panic!("expected submission, got {:?}", other),
        }
        assert!(session.is_pending());
        assert!(composer.draft().is_empty());
    }

    #[test]
    fn test_backslash_continues_line() {
        let mut composer = Composer::new();
        let mut session = Session::new();

        assert_eq!(
            feed_line(&mut composer, &mut session, "first line\\"),
            TriggerOutcome::LineBreak
        );
        assert!(session.is_empty());

        match feed_line(&mut composer, &mut session, "second line") {
            TriggerOutcome::Submitted(request) => {
                assert_eq!(request.query, "first line\nsecond line");
            }
            other => panic!("expected submission, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_line_is_ignored_and_cleared() {
        let mut composer = Composer::new();
        let mut session = Session::new();

        assert_eq!(
            feed_line(&mut composer, &mut session, "   "),
            TriggerOutcome::Ignored
        );
        assert!(composer.draft().is_empty());
        assert!(session.is_empty());
    }
}
