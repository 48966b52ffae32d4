use office_assistant::application::{Assistant, Notice, TurnOutcome};
use office_assistant::domain::Conversation;
use office_assistant::infrastructure::{assistant_from_config, AppConfig};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const BANNER: &str = "Swiss AI Office Assistant. Ask about HR or IT policies (Ctrl-D to quit).";

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "assistant=info,office_assistant=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = AppConfig::load()?;
    let mut assistant = assistant_from_config(&config)?;
    info!(docs = %config.documents.dir.display(), "preparing index");

    let mut stdout = tokio::io::stdout();
    print_notices(&mut stdout, &assistant.prepare().await).await?;
    stdout.write_all(format!("{BANNER}\n").as_bytes()).await?;

    run(&mut assistant, &mut stdout).await?;
    info!("session ended");
    Ok(())
}

async fn run(assistant: &mut Assistant, stdout: &mut tokio::io::Stdout) -> anyhow::Result<()> {
    let mut session = Conversation::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            stdout.write_all(b"\n").await?;
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let outcome = assistant.respond(&mut session, input).await;
        print_outcome(stdout, &outcome).await?;
    }
    Ok(())
}

async fn print_outcome(stdout: &mut tokio::io::Stdout, outcome: &TurnOutcome) -> anyhow::Result<()> {
    print_notices(stdout, &outcome.notices).await?;
    if let Some(reply) = &outcome.reply {
        stdout.write_all(format!("{reply}\n").as_bytes()).await?;
    }
    Ok(())
}

async fn print_notices(stdout: &mut tokio::io::Stdout, notices: &[Notice]) -> anyhow::Result<()> {
    for notice in notices {
        stdout.write_all(format!("{notice}\n").as_bytes()).await?;
    }
    stdout.flush().await?;
    Ok(())
}
