//! Live session: connect, register, and stream published console state.

use std::sync::Arc;

use tokio_stream::StreamExt;
use vccs_core::{ConsoleState, GgSlot, Session, TracingSink};

use crate::cli::{GlobalOpts, OutputFormat, RunArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

pub async fn handle(args: RunArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut session_config = config::session_config(global)?;
    if !args.positions.is_empty() {
        session_config.positions = args.positions;
    }

    let session = Session::load(session_config, Arc::new(TracingSink)).await?;
    session.init().await?;

    let color = output::should_color(global.color);
    let mut states = session.state_stream();
    let mut link = session.connection_state();

    let deadline = async {
        match args.duration {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending().await,
        }
    };
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(deadline, ctrl_c);

    let result = loop {
        tokio::select! {
            () = &mut deadline => break Ok(()),
            signal = &mut ctrl_c => break signal.map_err(CliError::from),
            Ok(()) = link.changed() => {
                let state = *link.borrow_and_update();
                tracing::info!(?state, "backend link changed");
            }
            Some(state) = states.next() => {
                if let Err(err) = print_state(&state, global, color) {
                    break Err(err);
                }
            }
        }
    };

    session.dispose().await;
    result
}

fn print_state(state: &ConsoleState, global: &GlobalOpts, color: bool) -> Result<(), CliError> {
    let out = match global.output {
        // one document per line while streaming
        OutputFormat::Json | OutputFormat::JsonCompact => output::render_json(state, true)?,
        OutputFormat::Table => summary(state, color),
        OutputFormat::Plain => gg_line(state, false),
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

/// One status line per published snapshot.
fn summary(state: &ConsoleState, color: bool) -> String {
    let when = state
        .updated_at
        .map_or_else(|| "--:--:--".into(), |t| t.format("%H:%M:%S").to_string());
    let who = state
        .identity
        .as_ref()
        .map_or("-", |identity| identity.callsign.as_str());

    let mut line = format!(
        "[{when}] {} A/G {} | G/G {}",
        output::paint_ident(who, color),
        state.ag.len(),
        gg_line(state, color),
    );
    if !state.vscs.is_empty() {
        line.push_str(&format!(" | VSCS {}", state.vscs.len()));
    }
    if state.overridden() {
        line.push_str(" | OVERRIDDEN");
    }
    if state.transmit_key {
        line.push_str(" | PTT");
    }
    line.push_str(&format!(
        " | dial {}",
        output::paint_status(state.dial_status.as_str(), color)
    ));
    line
}

fn gg_line(state: &ConsoleState, color: bool) -> String {
    let slots: Vec<String> = state
        .gg
        .iter()
        .map(|slot| match slot {
            GgSlot::Placeholder => "-".into(),
            GgSlot::Line(line) => {
                format!("{}:{}", line.line_id, output::paint_status(&line.status, color))
            }
        })
        .collect();
    slots.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use vccs_core::{CallKind, DialStatus, Identity, LineStatus};

    #[test]
    fn summary_lists_panel_in_order() {
        let state = ConsoleState {
            identity: Some(Identity {
                callsign: "OAK_40_CTR".into(),
                id: Some(7),
            }),
            gg: vec![
                GgSlot::Line(LineStatus {
                    call: "gg_100".into(),
                    kind: CallKind::GroundGroundDirect,
                    line_id: "100".into(),
                    label: "Tower".into(),
                    line_type: None,
                    status: "ok".into(),
                    talking: None,
                }),
                GgSlot::Placeholder,
            ],
            transmit_key: true,
            dial_status: DialStatus::Idle,
            ..ConsoleState::default()
        };

        assert_eq!(
            summary(&state, false),
            "[--:--:--] OAK_40_CTR A/G 0 | G/G 100:ok - | PTT | dial idle"
        );
    }
}
