use std::sync::Arc;

use tallylog_protocol::{
    BlockKey, BlockLayout, LogSink, ProtocolConfig, ProtocolHandler, ServeMode, Server,
};
use tallylog_stream::TcpChannelSource;
use tracing::info;

use crate::cmd::ServeArgs;
use crate::exit::{config_error, server_error, stream_error, CliResult, SUCCESS};

pub fn run(args: ServeArgs) -> CliResult<i32> {
    let key = match &args.key {
        Some(path) => Some(
            BlockKey::load(path)
                .map_err(|err| config_error("failed to load decryption key", err))?,
        ),
        None => {
            info!("no decryption key loaded");
            None
        }
    };
    let config = ProtocolConfig {
        key,
        layout: BlockLayout::default(),
        info_messages: args.info_messages,
    };

    let sink = LogSink::append_file(&args.log_file)
        .map_err(|err| stream_error("failed to open log file", err))?;
    let source = TcpChannelSource::bind(args.listen.as_str())
        .map_err(|err| stream_error("bind failed", err))?;
    info!(
        addr = %source.local_addr(),
        log_file = %args.log_file.display(),
        "collector listening"
    );

    let mode = if args.concurrent {
        ServeMode::ThreadPerChannel
    } else {
        ServeMode::Sequential
    };
    let mut server =
        Server::new(source, ProtocolHandler::new(Arc::new(config)), sink).with_mode(mode);
    if let Some(max) = args.max_requests {
        server = server.with_max_requests(max);
    }

    server.run().map_err(server_error)?;
    Ok(SUCCESS)
}
