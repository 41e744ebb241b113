//! 인증 게이트웨이 운영 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 프로바이더 상태 확인
//! authgate health
//!
//! # 사용자 목록
//! authgate users list
//!
//! # 테스트 계정 삭제 (ADMIN_EMAIL, ADMIN_PASSWORD 필요)
//! authgate users delete 3f1c0b7e-...
//!
//! # 토큰 검증
//! authgate token inspect eyJhbGciOi... --kind refresh
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing::error;

use authgate_api::GoTrueClient;
use authgate_cli::{check_health, delete_user, format_users, inspect_token, list_users};
use authgate_core::{init_logging, GatewayConfig, LogConfig, TokenCodec, TokenKind};

#[derive(Parser)]
#[command(name = "authgate")]
#[command(about = "Auth gateway operator CLI", long_about = None)]
#[command(version)]
struct Cli {
    /// 설정 파일 경로 (기본: config/default.toml, 없으면 환경 변수만 사용)
    #[arg(short, long, global = true, env = "AUTHGATE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 아이덴티티 프로바이더 상태 확인
    Health,

    /// 사용자 관리
    Users {
        #[command(subcommand)]
        command: UsersCommand,
    },

    /// 토큰 도구
    Token {
        #[command(subcommand)]
        command: TokenCommand,
    },
}

#[derive(Subcommand)]
enum UsersCommand {
    /// 전체 사용자 목록
    List,
    /// 사용자 삭제
    Delete {
        /// 프로바이더 사용자 ID
        user_id: String,
    },
}

#[derive(Subcommand)]
enum TokenCommand {
    /// 토큰을 로컬에서 검증하고 클레임을 출력
    Inspect {
        /// 검증할 토큰
        token: String,
        /// 기대하는 토큰 종류 (access, refresh). 생략하면 토큰에 적힌 종류 사용
        #[arg(short, long)]
        kind: Option<String>,
    },
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = GatewayConfig::load(cli.config.as_deref()).context("Invalid configuration")?;

    match cli.command {
        Commands::Health => {
            let provider = GoTrueClient::new(&config.provider)?;
            let status = check_health(&provider).await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Commands::Users { command } => {
            let provider = GoTrueClient::new(&config.provider)?;
            match command {
                UsersCommand::List => {
                    let users = list_users(&provider).await?;
                    println!("{}", format_users(&users));
                }
                UsersCommand::Delete { user_id } => {
                    delete_user(&provider, config.admin.credentials(), &user_id).await?;
                    println!("Deleted user {user_id}");
                }
            }
        }
        Commands::Token {
            command: TokenCommand::Inspect { token, kind },
        } => {
            let kind = kind
                .map(|k| {
                    TokenKind::parse(&k)
                        .ok_or_else(|| anyhow!("Invalid token kind: {k}. Supported: access, refresh"))
                })
                .transpose()?;

            let codec = TokenCodec::from_config(&config.token)?;
            let inspection = inspect_token(&codec, &token, kind);
            println!("{}", inspection.report());
            if !inspection.is_valid() {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Err(e) = init_logging(LogConfig::new("warn")) {
        eprintln!("Failed to initialize logging: {e}");
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
