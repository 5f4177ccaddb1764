use ledger_crypto::{encrypt_then_sign, verify_then_decrypt, KeyPair, PublicKey, VerifyingKey};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::WireError;
use crate::frame::{read_frame, write_frame};
use crate::message::Message;

/// Send `msg` as plaintext JSON. Used only for the two admission messages
/// exchanged before either side knows the other's keys (`NODE_KEYS`,
/// `TRACKER_IDENT`).
pub async fn send_plain<W: AsyncWrite + Unpin>(writer: &mut W, msg: &Message) -> Result<(), WireError> {
    let payload = serde_json::to_vec(msg)?;
    write_frame(writer, &payload).await
}

pub async fn recv_plain<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Message, WireError> {
    let payload = read_frame(reader).await?.ok_or(WireError::LinkClosed)?;
    Ok(serde_json::from_slice(&payload)?)
}

/// Send `msg` encrypt-then-sign for `their_public`, using `keypair`'s
/// signing key.
pub async fn send_encrypted<W: AsyncWrite + Unpin>(
    writer: &mut W,
    keypair: &KeyPair,
    their_public: &PublicKey,
    msg: &Message,
) -> Result<(), WireError> {
    let plaintext = serde_json::to_vec(msg)?;
    let blob = encrypt_then_sign(keypair, their_public, &plaintext)?;
    write_frame(writer, &blob).await
}

/// Read one frame, verify-then-decrypt it against `their_verify`/`their_public`.
pub async fn recv_encrypted<R: AsyncRead + Unpin>(
    reader: &mut R,
    keypair: &KeyPair,
    their_verify: &VerifyingKey,
    their_public: &PublicKey,
) -> Result<Message, WireError> {
    let blob = read_frame(reader).await?.ok_or(WireError::LinkClosed)?;
    let plaintext = verify_then_decrypt(keypair, their_verify, their_public, &blob)?;
    Ok(serde_json::from_slice(&plaintext)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_crypto::KeyPair;
    use std::io::Cursor;

    #[tokio::test]
    async fn plain_round_trips() {
        let mut buf = Vec::new();
        send_plain(&mut buf, &Message::NodeIdent {}).await.unwrap();
        let mut cursor = Cursor::new(buf);
        let msg = recv_plain(&mut cursor).await.unwrap();
        assert!(msg.expect_node_ident().is_ok());
    }

    #[tokio::test]
    async fn encrypted_round_trips() {
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();

        let mut buf = Vec::new();
        send_encrypted(&mut buf, &alice, &bob.public_key(), &Message::PeerVerify {})
            .await
            .unwrap();

        let mut cursor = Cursor::new(buf);
        let msg = recv_encrypted(&mut cursor, &bob, &alice.verifying_key(), &alice.public_key())
            .await
            .unwrap();
        assert!(msg.expect_peer_verify().is_ok());
    }

    #[tokio::test]
    async fn encrypted_rejects_wrong_verify_key() {
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();
        let mallory = KeyPair::generate();

        let mut buf = Vec::new();
        send_encrypted(&mut buf, &alice, &bob.public_key(), &Message::PeerAccept {})
            .await
            .unwrap();

        let mut cursor = Cursor::new(buf);
        let result = recv_encrypted(&mut cursor, &bob, &mallory.verifying_key(), &alice.public_key()).await;
        assert!(result.is_err());
    }
}
