//! Simple chat client example
//!
//! Connects anonymously to Twitch chat, joins a channel and prints what it
//! sees. With `TMI_USERNAME` and `TMI_PASSWORD` set it logs in as that user
//! and says hello instead.
//!
//! ```text
//! RUST_LOG=tmi_proto=debug cargo run --example simple_client -- pajlada
//! ```

use anyhow::Context;
use tokio::net::TcpStream;
use tracing_subscriber::EnvFilter;

use tmi_proto::connection::{Connection, ConnectionConfig, ConnectionEvent};
use tmi_proto::operations::{login_from_config, say};
use tmi_proto::Transport;

const SERVER: &str = "irc.chat.twitch.tv:6667";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let channel = std::env::args().nth(1).unwrap_or_else(|| "pajlada".to_owned());
    let config = match (std::env::var("TMI_USERNAME"), std::env::var("TMI_PASSWORD")) {
        (Ok(user), Ok(pass)) => ConnectionConfig::with_credentials(user, pass),
        _ => ConnectionConfig::default(),
    };
    let anonymous = config.is_anonymous();

    let stream = TcpStream::connect(SERVER)
        .await
        .with_context(|| format!("connecting to {}", SERVER))?;
    let (conn, outbound) = Connection::new(config);
    let driver = tokio::spawn(Transport::tcp(stream).run(conn.clone(), outbound));

    let _printer = conn.subscribe(|event| match event {
        ConnectionEvent::Message(msg) if msg.command() == "PRIVMSG" => {
            let name = msg.tag("display-name").or(msg.nickname()).unwrap_or("?");
            println!("← {}: {}", name, msg.trailing().unwrap_or_default());
        }
        ConnectionEvent::Closed(cause) => println!("connection closed: {:?}", cause),
        _ => {}
    });

    let mut errors = conn.errors();
    tokio::spawn(async move {
        while let Ok(error) = errors.recv().await {
            let chain: Vec<_> = error.chain().map(|e| e.message().to_owned()).collect();
            eprintln!("error [{}]: {}", error.kind(), chain.join(": "));
        }
    });

    login_from_config(&conn).await.context("login")?;
    println!("logged in");

    conn.send("CAP REQ :twitch.tv/tags twitch.tv/commands")?;
    conn.send(&format!("JOIN #{}", channel))?;

    if !anonymous {
        let state = say(&conn, &channel, "hello from tmi-proto").await?;
        println!("said hello, badges: {}", state.badges()?);
    }

    tokio::select! {
        _ = tokio::signal::ctrl_c() => conn.close(None),
        result = driver => result??,
    }
    Ok(())
}
