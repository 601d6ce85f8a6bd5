//! Worked example of both handler shapes, standing in for a real per-language
//! runtime. Not wired into any production path; `cmd/worker-shell` binds one
//! of these depending on which shape it is asked to demonstrate.

use bytes::Bytes;
use rand::seq::SliceRandom;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::handler::{StreamingHandler, UnaryHandler};

/// Echoes its input back unchanged, one reply per request.
pub struct EchoHandler;

#[async_trait::async_trait]
impl UnaryHandler for EchoHandler {
    async fn handle(&self, input: Bytes) -> Option<Bytes> {
        Some(input)
    }
}

const WORDS: [&str; 5] = ["apple", "banana", "cherry", "date", "elderberry"];

#[derive(Serialize)]
struct Payload<'a> {
    word: &'a str,
}

/// For every input element received, emits one JSON `{"word": ...}` reply
/// picked at random, for as long as the session's input stays open.
pub struct RandomWordHandler;

#[async_trait::async_trait]
impl StreamingHandler for RandomWordHandler {
    async fn handle(&self, mut input: mpsc::Receiver<Bytes>, output: mpsc::Sender<Bytes>) {
        while input.recv().await.is_some() {
            let word = WORDS.choose(&mut rand::thread_rng()).unwrap();
            let payload = Payload { word };
            let Ok(json) = serde_json::to_vec(&payload) else {
                continue;
            };
            if output.send(Bytes::from(json)).await.is_err() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echo_handler_returns_its_input() {
        let handler = EchoHandler;
        let out = handler.handle(Bytes::from_static(b"hello")).await;
        assert_eq!(out, Some(Bytes::from_static(b"hello")));
    }

    #[tokio::test]
    async fn random_word_handler_emits_one_reply_per_input() {
        let (input_tx, input_rx) = mpsc::channel(4);
        let (output_tx, mut output_rx) = mpsc::channel(4);
        let handler = RandomWordHandler;

        let run = tokio::spawn(async move {
            handler.handle(input_rx, output_tx).await;
        });

        input_tx.send(Bytes::from_static(b"one")).await.unwrap();
        input_tx.send(Bytes::from_static(b"two")).await.unwrap();
        drop(input_tx);

        let first = output_rx.recv().await.unwrap();
        let second = output_rx.recv().await.unwrap();
        assert!(output_rx.recv().await.is_none());
        run.await.unwrap();

        for body in [first, second] {
            let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
            let word = value["word"].as_str().unwrap();
            assert!(WORDS.contains(&word));
        }
    }
}
