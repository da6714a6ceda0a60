//! Request identity derivation — the one place an inbound HTTP/WS request
//! becomes the opaque `Identity` every other component keys quota, cache,
//! and memory state off of.
//!
//! Order: an explicit bearer token (hashed, never stored raw) > an
//! `X-User-Id` header > `X-Forwarded-For` > the socket's peer address.

use axum::http::HeaderMap;
use sha2::{Digest, Sha256};
use std::net::SocketAddr;

use pitchline_core::types::Identity;

pub fn derive(headers: &HeaderMap, peer: Option<SocketAddr>) -> Identity {
    if let Some(token) = bearer_token(headers) {
        let hash = hex::encode(Sha256::digest(token.as_bytes()));
        return Identity::from(format!("token:{}", &hash[..16]));
    }

    if let Some(user_id) = headers.get("x-user-id").and_then(|v| v.to_str().ok()) {
        if !user_id.is_empty() {
            return Identity::from(format!("user:{user_id}"));
        }
    }

    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next().map(str::trim) {
            if !first.is_empty() {
                return Identity::from(format!("ip:{first}"));
            }
        }
    }

    match peer {
        Some(addr) => Identity::from(format!("ip:{}", addr.ip())),
        None => Identity::from("ip:unknown"),
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_takes_priority_over_everything() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer secret-token".parse().unwrap());
        headers.insert("x-user-id", "u1".parse().unwrap());
        let id = derive(&headers, None);
        assert!(id.as_str().starts_with("token:"));
    }

    #[test]
    fn falls_back_to_user_id_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-user-id", "u1".parse().unwrap());
        assert_eq!(derive(&headers, None).as_str(), "user:u1");
    }

    #[test]
    fn falls_back_to_peer_address() {
        let headers = HeaderMap::new();
        let peer: SocketAddr = "127.0.0.1:9000".parse().unwrap();
        assert_eq!(derive(&headers, Some(peer)).as_str(), "ip:127.0.0.1");
    }

    #[test]
    fn same_token_always_derives_the_same_identity() {
        let mut a = HeaderMap::new();
        a.insert("authorization", "Bearer abc".parse().unwrap());
        let mut b = HeaderMap::new();
        b.insert("authorization", "Bearer abc".parse().unwrap());
        assert_eq!(derive(&a, None).as_str(), derive(&b, None).as_str());
    }
}
