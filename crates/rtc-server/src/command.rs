//! Inbound command parsing.
//!
//! Commands arrive as plain ASCII, `VERB` or `VERB:arg1:arg2:...`, one per
//! read.  Raw strings stop here: everything past this parser is a typed
//! [`Command`].
//!
//! | Wire form                                              | Variant          |
//! |--------------------------------------------------------|------------------|
//! | `GET_VEHICLES`                                         | `GetVehicles`    |
//! | `GET_PLOT_DATA`                                        | `GetPlotData`    |
//! | `GET_ALL_VEHICLES`                                     | `GetAllVehicles` |
//! | `GET_VEHICLE_POS:<id>`                                 | `GetVehiclePos`  |
//! | `HIGHLIGHT:<id>`                                       | `Highlight`      |
//! | `CHANGE_ROUTE:<id>:<poi,..>[:<secs,..>]`               | `ChangeRoute`    |
//! | `CLOSE_ROADS:<edge,..>`                                | `CloseRoads`     |
//! | `REOPEN_ROADS:<edge,..>` / `REOPEN_ALL_ROADS`          | `ReopenRoads` / `ReopenAllRoads` |
//! | `CREATE_EVENT:<json>`                                  | `CreateEvent`    |

use rtc_core::{AgentId, EdgeId};

use crate::{CommandError, CommandResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    GetVehicles,
    GetPlotData,
    GetAllVehicles,
    GetVehiclePos(AgentId),
    Highlight(AgentId),
    ChangeRoute {
        agent: AgentId,
        destinations: Vec<String>,
        /// Per-stop dwell times in seconds; pads with the default when
        /// shorter than `destinations`.
        durations: Vec<u32>,
    },
    CloseRoads(Vec<EdgeId>),
    ReopenRoads(Vec<EdgeId>),
    ReopenAllRoads,
    /// Raw JSON event body, decoded by the event pipeline.
    CreateEvent(String),
}

/// Parse one wire command.
pub fn parse_command(raw: &str) -> CommandResult<Command> {
    let raw = raw.trim();
    match raw {
        "GET_VEHICLES" => return Ok(Command::GetVehicles),
        "GET_PLOT_DATA" => return Ok(Command::GetPlotData),
        "GET_ALL_VEHICLES" => return Ok(Command::GetAllVehicles),
        "REOPEN_ALL_ROADS" => return Ok(Command::ReopenAllRoads),
        _ => {}
    }

    let Some((verb, args)) = raw.split_once(':') else {
        return Err(CommandError::Unknown(raw.to_string()));
    };

    match verb {
        "GET_VEHICLE_POS" => {
            nonempty(args, "GET_VEHICLE_POS").map(|id| Command::GetVehiclePos(id.into()))
        }
        "HIGHLIGHT" => nonempty(args, "HIGHLIGHT").map(|id| Command::Highlight(id.into())),
        "CHANGE_ROUTE" => parse_change_route(args),
        "CLOSE_ROADS" => Ok(Command::CloseRoads(edge_list(args))),
        "REOPEN_ROADS" => Ok(Command::ReopenRoads(edge_list(args))),
        "CREATE_EVENT" => nonempty(args, "CREATE_EVENT").map(Command::CreateEvent),
        _ => Err(CommandError::Unknown(raw.to_string())),
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn nonempty(args: &str, verb: &'static str) -> CommandResult<String> {
    let args = args.trim();
    if args.is_empty() {
        return Err(CommandError::MissingArg(verb));
    }
    Ok(args.to_string())
}

fn edge_list(args: &str) -> Vec<EdgeId> {
    args.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(EdgeId::from)
        .collect()
}

fn parse_change_route(args: &str) -> CommandResult<Command> {
    // <id>:<poi1,poi2,...>[:<dur1,dur2,...>]
    let mut parts = args.splitn(3, ':');
    let agent = parts.next().unwrap_or("").trim();
    if agent.is_empty() {
        return Err(CommandError::MissingArg("CHANGE_ROUTE"));
    }
    let destinations: Vec<String> = parts
        .next()
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if destinations.is_empty() {
        return Err(CommandError::MissingArg("CHANGE_ROUTE"));
    }

    let durations = match parts.next() {
        None => Vec::new(),
        Some(list) => list
            .split(',')
            .map(|d| d.trim().parse::<u32>())
            .collect::<Result<_, _>>()
            .map_err(|_| CommandError::BadDurations(list.to_string()))?,
    };

    Ok(Command::ChangeRoute { agent: agent.into(), destinations, durations })
}
