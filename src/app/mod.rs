//! 应用层：接收端套接字与恒定速率发送端。

mod onoff;
mod sink;

pub use onoff::{OnOffApp, SendPacket, SourceStart, SourceStop};
pub use sink::{SinkSocket, SinkStart, SinkStop, SocketTable};
