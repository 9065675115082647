use crate::error::LookupError;
use crate::license::spdx;
use crate::models::License;

/// Matches at or below this confidence are ignored.
pub const CONFIDENCE_THRESHOLD: f32 = 0.90;

/// One candidate produced by a [`Classifier`].
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub id: String,
    pub confidence: f32,
}

/// Classifies raw license text into SPDX identifiers.
pub trait Classifier: Send + Sync {
    fn classify(&self, text: &str) -> Vec<Match>;
}

/// Run `classifier` over `text` and turn the best confident match into a
/// [`License`] with its canonical registry name.
///
/// `Ok(None)` means nothing cleared the threshold. An id that clears the
/// threshold but is missing from the registry is an error, not a miss.
pub fn detect(text: &str, classifier: &dyn Classifier) -> Result<Option<License>, LookupError> {
    let mut best: Option<Match> = None;
    for m in classifier.classify(text) {
        if m.confidence > CONFIDENCE_THRESHOLD
            && best.as_ref().map_or(true, |b| m.confidence > b.confidence)
        {
            best = Some(m);
        }
    }

    let Some(best) = best else {
        return Ok(None);
    };

    let entry = spdx::lookup(&best.id).ok_or_else(|| LookupError::UnknownLicenseId(best.id))?;
    Ok(Some(License::new(entry.name, entry.id)))
}

struct Fingerprint {
    id: &'static str,
    /// Every phrase found adds `1 / phrases.len()` to the confidence.
    phrases: &'static [&'static str],
    /// Any of these present disqualifies the license outright.
    excludes: &'static [&'static str],
}

static FINGERPRINTS: &[Fingerprint] = &[
    Fingerprint {
        id: "MIT",
        phrases: &[
            "permission is hereby granted free of charge to any person obtaining a copy",
            "the above copyright notice and this permission notice shall be included in all copies or substantial portions of the software",
            "the software is provided as is without warranty of any kind",
        ],
        excludes: &[],
    },
    Fingerprint {
        id: "Apache-2.0",
        phrases: &[
            "apache license",
            "version 2 0 january 2004",
            "terms and conditions for use reproduction and distribution",
            "grant of patent license",
        ],
        excludes: &[],
    },
    Fingerprint {
        id: "BSD-3-Clause",
        phrases: &[
            "redistribution and use in source and binary forms with or without modification are permitted",
            "redistributions of source code must retain the above copyright notice",
            "redistributions in binary form must reproduce the above copyright notice",
            "neither the name of",
        ],
        excludes: &["all advertising materials mentioning features"],
    },
    Fingerprint {
        id: "BSD-2-Clause",
        phrases: &[
            "redistribution and use in source and binary forms with or without modification are permitted",
            "redistributions of source code must retain the above copyright notice",
            "redistributions in binary form must reproduce the above copyright notice",
        ],
        excludes: &["neither the name of", "all advertising materials mentioning features"],
    },
    Fingerprint {
        id: "ISC",
        phrases: &[
            "permission to use copy modify and or distribute this software for any purpose with or without fee is hereby granted",
            "the software is provided as is and the author disclaims all warranties",
        ],
        excludes: &[],
    },
    Fingerprint {
        id: "MPL-2.0",
        phrases: &[
            "mozilla public license version 2 0",
            "covered software",
            "source code form license notice",
        ],
        excludes: &[],
    },
    Fingerprint {
        id: "GPL-2.0",
        phrases: &["gnu general public license", "version 2 june 1991"],
        excludes: &["lesser general public license", "library general public license"],
    },
    Fingerprint {
        id: "GPL-3.0",
        phrases: &["gnu general public license", "version 3 29 june 2007"],
        excludes: &["lesser general public license", "affero general public license"],
    },
    Fingerprint {
        id: "LGPL-2.1",
        phrases: &["gnu lesser general public license", "version 2 1 february 1999"],
        excludes: &[],
    },
    Fingerprint {
        id: "LGPL-3.0",
        phrases: &["gnu lesser general public license", "version 3 29 june 2007"],
        excludes: &[],
    },
    Fingerprint {
        id: "AGPL-3.0",
        phrases: &["gnu affero general public license", "version 3 19 november 2007"],
        excludes: &[],
    },
    Fingerprint {
        id: "Unlicense",
        phrases: &["this is free and unencumbered software released into the public domain"],
        excludes: &[],
    },
    Fingerprint {
        id: "Zlib",
        phrases: &[
            "this software is provided as is without any express or implied warranty",
            "altered source versions must be plainly marked as such",
        ],
        excludes: &[],
    },
    Fingerprint {
        id: "BSL-1.0",
        phrases: &["boost software license version 1 0"],
        excludes: &[],
    },
];

/// Phrase-fingerprint classifier over a small bundled corpus.
///
/// Text is lowercased and every run of non-alphanumeric characters collapses
/// to a single space before matching, so line wrapping and punctuation do
/// not matter.
#[derive(Debug, Default, Clone, Copy)]
pub struct PhraseClassifier;

impl Classifier for PhraseClassifier {
    fn classify(&self, text: &str) -> Vec<Match> {
        let text = normalize_text(text);
        FINGERPRINTS
            .iter()
            .filter(|fp| !fp.excludes.iter().any(|e| text.contains(e)))
            .filter_map(|fp| {
                let hits = fp.phrases.iter().filter(|p| text.contains(*p)).count();
                if hits == 0 {
                    return None;
                }
                Some(Match {
                    id: fp.id.to_string(),
                    confidence: hits as f32 / fp.phrases.len() as f32,
                })
            })
            .collect()
    }
}

fn normalize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.extend(c.to_lowercase());
        } else {
            pending_space = true;
        }
    }
    out
}
