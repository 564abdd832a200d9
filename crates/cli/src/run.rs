use anyhow::Result;
use extract::Triplet;
use session::{Session, SessionEvent, SubmitAck};
use std::path::Path;

use crate::config::{AppConfig, RunArgs};
use crate::input;

pub async fn run(config: &AppConfig, args: RunArgs) -> Result<()> {
    let text = match &args.input {
        Some(path) => input::read_text_file(path).await?,
        None => args.text.join(" "),
    };

    let mut session = crate::start_session(config, &args.output)?;
    session.wait_ready().await;

    session.set_text(text);
    match session.submit() {
        Ok(SubmitAck::Accepted(_)) => {}
        Ok(SubmitAck::Ignored) => anyhow::bail!("An extraction is already running"),
        Err(e) => anyhow::bail!("{}", e.user_message()),
    }

    match session.wait_ready().await {
        Some(SessionEvent::Ready { .. }) => print_graph(&session),
        Some(SessionEvent::Failed(e)) => anyhow::bail!("Extraction failed: {}", e.user_message()),
        _ => anyhow::bail!("Extraction did not complete"),
    }

    if let Some(dir) = &args.output.export {
        export(&session, dir);
    }

    Ok(())
}

pub fn format_triplet(triplet: &Triplet) -> String {
    format!("{} -[{}]-> {}", triplet.head, triplet.relation, triplet.tail)
}

pub fn print_graph(session: &Session) {
    let triplets = session.triplets();
    if triplets.is_empty() {
        println!("No triplets found.");
        return;
    }

    for triplet in triplets {
        println!("{}", format_triplet(triplet));
    }
    if let Some(graph) = session.graph() {
        println!(
            "\n{} triplets, {} nodes, {} edges",
            triplets.len(),
            graph.node_count(),
            graph.edge_count()
        );
    }
}

pub fn export(session: &Session, dir: &Path) {
    if !session.can_export() {
        println!("No triplets to export.");
        return;
    }
    match session.export_triplets(dir) {
        Ok(path) => println!("Saved triplets to {}", path.display()),
        Err(e) => println!("Export failed: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_triplet() {
        assert_eq!(
            format_triplet(&Triplet::new("Obama", "born in", "Hawaii")),
            "Obama -[born in]-> Hawaii"
        );
    }
}
