use anyhow::Context;
use ocd_session::{ServerConfig, Session};

use crate::config::Config;
use crate::util::common_options::ConnectionOptions;

/// Opens a session as `options` ask for, runs `f` on it and shuts everything down again.
///
/// An error from `f` takes precedence over errors while stopping the server.
pub fn with_session<T>(
    options: &ConnectionOptions,
    config: &Config,
    f: impl FnOnce(&mut Session) -> anyhow::Result<T>,
) -> anyhow::Result<T> {
    let mut session = Session::new();

    if options.spawn_server {
        session
            .start_server(&ServerConfig::from(&config.server))
            .context("Failed to start OpenOCD.")?;
    }

    let connection = options.connection_config(config);
    session
        .open(&connection)
        .with_context(|| format!("Failed to open a session at {}.", connection.address()))?;

    let result = f(&mut session);

    session.close();
    let stopped = session.stop_server();

    let value = result?;
    stopped.context("Failed to stop OpenOCD.")?;
    Ok(value)
}

#[cfg(test)]
mod test {
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread::JoinHandle;

    use figment::Jail;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::Configs;

    /// Accepts one connection, answers every line with a prompt and returns the lines it got.
    fn echo_server() -> (u16, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let handle = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            stream.write_all(b"Open On-Chip Debugger\r\n> ").unwrap();

            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut lines = Vec::new();
            let mut line = String::new();
            while reader.read_line(&mut line).unwrap() > 0 {
                let command = line.trim_end().to_string();
                line.clear();

                stream.write_all(format!("{command}\r\n> ").as_bytes()).unwrap();
                let done = command == "exit";
                lines.push(command);
                if done {
                    break;
                }
            }
            lines
        });

        (port, handle)
    }

    fn options(port: u16) -> ConnectionOptions {
        ConnectionOptions {
            host: Some("127.0.0.1".to_string()),
            port: Some(port),
            timeout: Some(1000),
            spawn_server: false,
        }
    }

    fn config() -> Config {
        let mut config = None;
        Jail::expect_with(|jail| {
            config = Some(Configs::new(jail.directory()).extract().unwrap());
            Ok(())
        });
        config.unwrap()
    }

    #[test]
    fn options_override_the_configuration() {
        let config = config();

        let connection = options(4445).connection_config(&config);
        assert_eq!(connection.address(), "127.0.0.1:4445");
        assert_eq!(connection.timeout.as_millis(), 1000);

        let connection = ConnectionOptions::default().connection_config(&config);
        assert_eq!(connection.address(), "localhost:4444");
    }

    #[test]
    fn session_is_closed_after_the_command() {
        let (port, server) = echo_server();

        let response = with_session(&options(port), &config(), |session| {
            Ok(session.send_raw("targets")?)
        })
        .unwrap();

        assert_eq!(response, "targets");
        assert_eq!(server.join().unwrap(), ["targets", "exit"]);
    }

    #[test]
    fn command_errors_are_returned_after_closing() {
        let (port, server) = echo_server();

        let error = with_session(&options(port), &config(), |_| -> anyhow::Result<()> {
            anyhow::bail!("check failed")
        })
        .unwrap_err();

        assert_eq!(error.to_string(), "check failed");
        assert_eq!(server.join().unwrap(), ["exit"]);
    }

    #[test]
    fn unreachable_server_is_reported_with_the_address() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let error = with_session(&options(port), &config(), |_| Ok(())).unwrap_err();

        assert_eq!(
            error.to_string(),
            format!("Failed to open a session at 127.0.0.1:{port}.")
        );
    }
}
