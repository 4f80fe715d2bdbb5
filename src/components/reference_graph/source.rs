use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::Response;

#[derive(Debug, Error)]
pub enum FetchError {
	#[error("no browser window to fetch from")]
	NoWindow,
	#[error("request to `{url}` failed: {message}")]
	Transport { url: String, message: String },
	#[error("request to `{url}` returned HTTP {status}")]
	Status { url: String, status: u16 },
	#[error("malformed reference listing: {0}")]
	Decode(#[from] serde_json::Error),
	#[error("`{0}` is not in the reference listing")]
	UnknownDocument(String),
}

/// Where the outbound references of a document come from.
#[allow(async_fn_in_trait)]
pub trait ReferenceSource {
	async fn references(&self, id: &str) -> Result<Vec<String>, FetchError>;
}

/// Document id -> referenced ids, in listing order. Keys iterate sorted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ReferenceIndex(BTreeMap<String, Vec<String>>);

impl ReferenceIndex {
	pub fn from_json(text: &str) -> Result<Self, FetchError> {
		Ok(serde_json::from_str(text)?)
	}

	pub fn documents(&self) -> impl Iterator<Item = &str> {
		self.0.keys().map(String::as_str)
	}

	pub fn get(&self, id: &str) -> Option<&[String]> {
		self.0.get(id).map(Vec::as_slice)
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl<K, V> FromIterator<(K, V)> for ReferenceIndex
where
	K: Into<String>,
	V: IntoIterator,
	V::Item: Into<String>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self(
			iter.into_iter()
				.map(|(k, v)| (k.into(), v.into_iter().map(Into::into).collect()))
				.collect(),
		)
	}
}

impl ReferenceSource for ReferenceIndex {
	async fn references(&self, id: &str) -> Result<Vec<String>, FetchError> {
		self.get(id)
			.map(<[String]>::to_vec)
			.ok_or_else(|| FetchError::UnknownDocument(id.to_owned()))
	}
}

/// Reads the listing over HTTP with the browser's `fetch`.
///
/// The listing is fetched again for every lookup so that documents added on
/// the server since the page loaded are picked up.
#[derive(Clone, Debug)]
pub struct HttpReferenceSource {
	url: String,
}

impl HttpReferenceSource {
	pub fn new(url: impl Into<String>) -> Self {
		Self { url: url.into() }
	}

	fn transport(&self, err: JsValue) -> FetchError {
		FetchError::Transport {
			url: self.url.clone(),
			message: err.as_string().unwrap_or_else(|| format!("{err:?}")),
		}
	}

	pub async fn fetch_index(&self) -> Result<ReferenceIndex, FetchError> {
		let window = web_sys::window().ok_or(FetchError::NoWindow)?;
		let promise: js_sys::Promise = window.fetch_with_str(&self.url);
		let response: Response = JsFuture::from(promise)
			.await
			.and_then(|value| value.dyn_into())
			.map_err(|err| self.transport(err))?;
		if !response.ok() {
			return Err(FetchError::Status {
				url: self.url.clone(),
				status: response.status(),
			});
		}
		let body = response.text().map_err(|err| self.transport(err))?;
		let text = JsFuture::from(body)
			.await
			.map_err(|err| self.transport(err))?
			.as_string()
			.unwrap_or_default();
		ReferenceIndex::from_json(&text)
	}
}

impl ReferenceSource for HttpReferenceSource {
	async fn references(&self, id: &str) -> Result<Vec<String>, FetchError> {
		self.fetch_index().await?.references(id).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn listing_json_keeps_reference_order() {
		let index = ReferenceIndex::from_json(
			r#"{"2020-b-x": ["z", "a", "m"], "2019-a-y": []}"#,
		)
		.expect("valid listing");
		assert_eq!(index.len(), 2);
		assert_eq!(index.get("2020-b-x"), Some(&["z".to_owned(), "a".to_owned(), "m".to_owned()][..]));
		assert_eq!(index.documents().collect::<Vec<_>>(), ["2019-a-y", "2020-b-x"]);
	}

	#[test]
	fn malformed_listing_is_a_decode_error() {
		let err = ReferenceIndex::from_json(r#"{"a": "not a list"}"#).unwrap_err();
		assert!(matches!(err, FetchError::Decode(_)));
	}

	#[test]
	fn unknown_document_lookup_fails() {
		let index: ReferenceIndex = [("a", vec!["b"])].into_iter().collect();
		let err = pollster::block_on(index.references("missing")).unwrap_err();
		assert!(matches!(err, FetchError::UnknownDocument(id) if id == "missing"));
		assert_eq!(
			pollster::block_on(index.references("a")).expect("known document"),
			vec!["b".to_owned()]
		);
	}
}
