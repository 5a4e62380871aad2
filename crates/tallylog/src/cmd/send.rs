use tallylog_protocol::{build_request, send_request, BlockKey, BlockLayout, Response};
use tallylog_stream::TcpChannelSource;
use tracing::debug;

use crate::cmd::SendArgs;
use crate::exit::{
    config_error, stream_error, CliError, CliResult, FAILURE, SUCCESS, TRANSPORT_ERROR, USAGE,
};
use crate::output::{render_send_report, response_name, OutputFormat, SendReport};

pub fn run(args: SendArgs) -> CliResult<i32> {
    check_single_line("--device", &args.device)?;
    if let Some(stats) = &args.stats {
        check_single_line("--stats", stats)?;
    }
    for event in &args.events {
        check_single_line("--event", event)?;
    }

    let key = args
        .key
        .as_ref()
        .map(BlockKey::load)
        .transpose()
        .map_err(|err| config_error("failed to load encryption key", err))?;

    let request = build_request(
        &args.device,
        args.stats.as_deref(),
        &args.events,
        key.as_ref(),
        &BlockLayout::default(),
        &mut rand::thread_rng(),
    )
    .map_err(|err| config_error("failed to encrypt report", err))?;
    debug!(bytes = request.len(), encrypted = key.is_some(), "request built");

    let channel = TcpChannelSource::connect(args.addr.as_str())
        .map_err(|err| stream_error("connect failed", err))?;
    let response =
        send_request(channel, &request).map_err(|err| stream_error("send failed", err))?;

    if let Response::Unexpected(bytes) = &response {
        return Err(CliError::new(
            TRANSPORT_ERROR,
            format!(
                "unexpected response from {}: {:?}",
                args.addr,
                String::from_utf8_lossy(bytes)
            ),
        ));
    }

    let report = SendReport {
        address: &args.addr,
        device: &args.device,
        encrypted: key.is_some(),
        events: args.events.len(),
        request_bytes: request.len(),
        response: response_name(&response),
    };
    let format = args.format.unwrap_or_else(OutputFormat::default_for_stdout);
    println!("{}", render_send_report(&report, format));

    Ok(match response {
        Response::Accepted => SUCCESS,
        _ => FAILURE,
    })
}

fn check_single_line(flag: &str, value: &str) -> CliResult<()> {
    if value.contains('\n') {
        return Err(CliError::new(
            USAGE,
            format!("{flag} must not contain a newline"),
        ));
    }
    Ok(())
}
