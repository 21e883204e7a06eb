use anyhow::Context;
use fitness_chat_client::{
    ChatSession, ChatStore, ClientConfig, FitnessApiClient, SessionError, UploadFile,
};
use tokio::io::{AsyncBufReadExt, BufReader};

enum Command<'a> {
    Quit,
    Clear,
    Model(&'a str),
    Recipes(bool),
    Upload { file_type: &'a str, paths: Vec<&'a str> },
    Say(&'a str),
    Invalid(&'static str),
}

fn parse_command(line: &str) -> Command<'_> {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Say(line);
    };
    let mut parts = rest.split_whitespace();
    match parts.next() {
        Some("quit") | Some("exit") => Command::Quit,
        Some("clear") => Command::Clear,
        Some("model") => match parts.next() {
            Some(model) => Command::Model(model),
            None => Command::Invalid("usage: /model <id>"),
        },
        Some("recipes") => match parts.next() {
            Some("on") => Command::Recipes(true),
            Some("off") => Command::Recipes(false),
            _ => Command::Invalid("usage: /recipes on|off"),
        },
        Some("upload") => match parts.next() {
            Some(file_type) => {
                let paths: Vec<&str> = parts.collect();
                if paths.is_empty() {
                    Command::Invalid("usage: /upload <file_type> <path>...")
                } else {
                    Command::Upload { file_type, paths }
                }
            }
            None => Command::Invalid("usage: /upload <file_type> <path>..."),
        },
        _ => Command::Invalid("commands: /model, /recipes, /upload, /clear, /quit"),
    }
}

async fn load_files(paths: &[&str]) -> anyhow::Result<Vec<UploadFile>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let file = UploadFile::from_path(path)
            .await
            .with_context(|| format!("reading {path}"))?;
        files.push(file);
    }
    Ok(files)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = ClientConfig::from_env();
    tracing::info!(base_url = %config.base_url, "fitness chat client starting");

    let store = ChatStore::with_default_model(config.default_model.clone());
    let sub = store.subscribe(|state| {
        tracing::debug!(
            messages = state.messages.len(),
            is_loading = state.is_loading,
            model = %state.selected_model,
            "state changed"
        );
    });
    let mut session = ChatSession::new(FitnessApiClient::new(config), store.clone());

    println!("🏋️ Fitness chat ready. Type a question, or /quit to leave.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        match parse_command(&line) {
            Command::Quit => break,
            Command::Clear => {
                store.clear();
                println!("(conversation cleared)");
            }
            Command::Model(model) => {
                store.set_model(model);
                println!("(model set to {model})");
            }
            Command::Recipes(on) => {
                session.set_include_recipes(on);
                println!("(recipes {})", if on { "on" } else { "off" });
            }
            Command::Upload { file_type, paths } => {
                let files = match load_files(&paths).await {
                    Ok(files) => files,
                    Err(err) => {
                        eprintln!("{err:#}");
                        continue;
                    }
                };
                match session.upload(files, file_type).await {
                    Ok(reply) => println!("{reply}"),
                    Err(err) => eprintln!("upload failed: {err}"),
                }
            }
            Command::Say(text) => match session.send(text).await {
                Ok(reply) => {
                    println!("{}", reply.response);
                    if let Some(recipes) = reply.recipes {
                        println!("{}", serde_json::to_string_pretty(&recipes)?);
                    }
                }
                Err(SessionError::EmptyMessage) => {}
                Err(err) => eprintln!("error: {err}"),
            },
            Command::Invalid(usage) => eprintln!("{usage}"),
        }
    }

    sub.unsubscribe();
    store.dispose();
    Ok(())
}
