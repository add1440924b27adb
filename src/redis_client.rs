use redis::{ConnectionLike, RedisResult, Value};

use crate::track::{CommandExecutor, QueuedCommand};

/// [`CommandExecutor`] backed by a real Redis connection.
///
/// Works over anything `redis::ConnectionLike`, so a plain `Connection`
/// and a pooled or clustered one are equally usable underneath the
/// tracking layer.
pub struct RedisExecutor<C> {
    conn: C,
}

impl<C: ConnectionLike> RedisExecutor<C> {
    pub fn new(conn: C) -> Self {
        Self { conn }
    }

    pub fn into_inner(self) -> C {
        self.conn
    }
}

impl<C: ConnectionLike> CommandExecutor for RedisExecutor<C> {
    fn run_command(&mut self, command: &QueuedCommand) -> RedisResult<Value> {
        let mut cmd = redis::cmd(&command.name);
        for arg in &command.args {
            cmd.arg(arg.as_str());
        }
        cmd.query(&mut self.conn)
    }

    fn run_pipeline(&mut self, commands: &[QueuedCommand]) -> RedisResult<Vec<Value>> {
        let mut pipe = redis::pipe();
        for command in commands {
            let entry = pipe.cmd(&command.name);
            for arg in &command.args {
                entry.arg(arg.as_str());
            }
        }
        pipe.query(&mut self.conn)
    }
}

/// Opens a connection and wraps it in a [`RedisExecutor`].
pub fn connect(url: &str) -> RedisResult<RedisExecutor<redis::Connection>> {
    let client = redis::Client::open(url)?;
    let conn = client.get_connection()?;
    Ok(RedisExecutor::new(conn))
}
