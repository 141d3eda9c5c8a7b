//! Wire framing for turn streams: fragment envelopes, the `[DONE]`
//! sentinel, and the terminal error envelope.

use std::pin::Pin;

use async_stream::stream;
use futures_core::Stream;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};

use crate::{ChatEvent, ChatStream};

/// End-of-stream sentinel delivered as the final successful frame's text.
pub const DONE_SENTINEL: &str = "[DONE]";

const FRAGMENT_MESSAGE: &str = "Success";
const DONE_MESSAGE: &str = "Chat completed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameStatus {
    Ok,
    Error,
}

/// One serialized frame on the client-facing stream.
///
/// Every stream ends with exactly one terminal frame: either the `[DONE]`
/// sentinel or an error envelope. Clients stop reading at the terminal
/// frame regardless of which one arrives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FramedEvent {
    pub status: FrameStatus,
    pub text: String,
    pub message: String,
}

impl FramedEvent {
    pub fn fragment(text: impl Into<String>) -> Self {
        Self {
            status: FrameStatus::Ok,
            text: text.into(),
            message: FRAGMENT_MESSAGE.to_string(),
        }
    }

    pub fn done() -> Self {
        Self {
            status: FrameStatus::Ok,
            text: DONE_SENTINEL.to_string(),
            message: DONE_MESSAGE.to_string(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: FrameStatus::Error,
            text: String::new(),
            message: message.into(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status == FrameStatus::Error || self.text == DONE_SENTINEL
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

pub type FramedStream<'a> = Pin<Box<dyn Stream<Item = FramedEvent> + Send + 'a>>;

/// Maps a turn's event stream onto the client framing.
#[derive(Debug, Default, Clone, Copy)]
pub struct StreamFramer;

impl StreamFramer {
    pub fn new() -> Self {
        Self
    }

    pub fn frame<'a>(&self, events: ChatStream<'a>) -> FramedStream<'a> {
        Box::pin(stream! {
            let mut events = events;
            let mut terminated = false;

            while let Some(event) = events.next().await {
                match event {
                    Ok(ChatEvent::Fragment(text)) => yield FramedEvent::fragment(text),
                    Ok(ChatEvent::TurnComplete(_)) => {
                        yield FramedEvent::done();
                        terminated = true;
                        break;
                    }
                    Err(error) => {
                        yield FramedEvent::error(error.to_string());
                        terminated = true;
                        break;
                    }
                }
            }

            if !terminated {
                yield FramedEvent::done();
            }
        })
    }
}
