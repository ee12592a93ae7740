//! CLI `chat` command: a single message, or a REPL when no message is given.

use anyhow::Result;
use std::io::{BufRead, Write};

use echosoul::brain::{ChatReply, Companion, CompanionServices, QuickAction};
use echosoul::config::EchoConfig;
use echosoul::display::format_memory_for_display;

const REPL_HELP: &str = "\
Commands:
  /recall    ask EchoSoul to remember something
  /checkin   daily emotional check-in
  /story     share a story
  /summary   emotions in this session
  /quit      leave";

fn print_reply(companion: &Companion, reply: &ChatReply) {
    let emotion = reply.emotion_analysis.dominant_emotion;
    println!(
        "{} {}: {}",
        emotion.emoji(),
        companion.personality().name(),
        reply.response
    );
    if !reply.relevant_memories.is_empty() {
        println!("  remembered:");
        for recalled in &reply.relevant_memories {
            println!("    {}", format_memory_for_display(&recalled.memory, 80));
        }
    }
}

pub async fn chat(config: EchoConfig, email: &str, message: Option<String>) -> Result<()> {
    let services = CompanionServices::from_config(config)?;
    let email_owned = email.to_string();
    let user_id = services
        .with_db(move |conn| super::resolve_user(conn, &email_owned))
        .await?;
    let mut companion = Companion::new(user_id, services).await?;

    if let Some(message) = message {
        let reply = companion.respond(&message, None).await?;
        print_reply(&companion, &reply);
        return Ok(());
    }

    println!(
        "{}! {} is listening. Type /help for commands.",
        echosoul::display::greeting(),
        companion.personality().name()
    );

    let stdin = std::io::stdin();
    loop {
        print!("you> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();

        let reply = match line {
            "" => continue,
            "/quit" | "/exit" => break,
            "/help" => {
                println!("{REPL_HELP}");
                continue;
            }
            "/summary" => {
                let summary = companion.conversation_summary(20);
                println!(
                    "  {} turns, mood {}, mostly {}",
                    summary.total_conversations,
                    summary.emotion_trend,
                    summary.dominant_emotion_pattern
                );
                continue;
            }
            cmd if cmd.starts_with('/') => match cmd[1..].parse::<QuickAction>() {
                Ok(action) => companion.quick_action(action).await,
                Err(e) => {
                    println!("  {e}");
                    continue;
                }
            },
            text => companion.respond(text, None).await,
        };

        match reply {
            Ok(reply) => print_reply(&companion, &reply),
            Err(e) => {
                tracing::error!(error = %e, "chat turn failed");
                println!("  (something went wrong: {e})");
            }
        }
    }

    Ok(())
}
