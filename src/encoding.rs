// SPDX-License-Identifier: Apache-2.0

//! Character-set handling for the string↔bytes edges.
//!
//! Labels are resolved through the WHATWG registry, so aliases like
//! `"latin1"` or `"utf8"` work. Malformed or unmappable text is an error
//! rather than being replaced; silent replacement would corrupt round-trips.

use encoding_rs::Encoding;
use crate::{Error, Result};

pub(crate) fn encode(text: String, label: &str) -> Result<Vec<u8>> {
	let encoding = lookup(label)?;
	if encoding == encoding_rs::UTF_8 {
		return Ok(text.into_bytes());
	}
	let (bytes, _, unmappable) = encoding.encode(&text);
	if unmappable {
		return Err(Error::Encode { encoding: encoding.name() });
	}
	Ok(bytes.into_owned())
}

pub(crate) fn decode(bytes: Vec<u8>, label: &str) -> Result<String> {
	let encoding = lookup(label)?;
	if encoding == encoding_rs::UTF_8 {
		return match simdutf8::compat::from_utf8(&bytes) {
			// Safety: validated as UTF-8 just above.
			Ok(_) => Ok(unsafe { String::from_utf8_unchecked(bytes) }),
			Err(_) => Err(Error::Decode { encoding: encoding.name() }),
		};
	}
	let (text, had_errors) = encoding.decode_without_bom_handling(&bytes);
	if had_errors {
		return Err(Error::Decode { encoding: encoding.name() });
	}
	Ok(text.into_owned())
}

pub(crate) fn lookup(label: &str) -> Result<&'static Encoding> {
	Encoding::for_label(label.trim().as_bytes())
		.ok_or_else(|| Error::UnknownEncoding(label.into()))
}
