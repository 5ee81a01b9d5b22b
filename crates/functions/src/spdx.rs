//! Keyword-based licence text classifier.
//!
//! A licence file is first checked for `SPDX-License-Identifier:` tags; if it
//! has none, its normalized text is matched against a fixed table of
//! distinguishing phrases. This recognizes the common licences by their
//! standard wording, nothing more.

struct Rule {
    id: &'static str,
    all: &'static [&'static str],
    none: &'static [&'static str],
}

// Ordered so the more specific licence of a family is tried first. The GPL
// family is keyed on its title lines since each text names its siblings.
const RULES: &[Rule] = &[
    Rule {
        id: "AGPL-3.0",
        all: &["gnu affero general public license version 3"],
        none: &[],
    },
    Rule {
        id: "LGPL-3.0",
        all: &["gnu lesser general public license version 3"],
        none: &[],
    },
    Rule {
        id: "LGPL-2.1",
        all: &["gnu lesser general public license version 2.1"],
        none: &[],
    },
    Rule {
        id: "GPL-3.0",
        all: &["gnu general public license version 3"],
        none: &[
            "gnu lesser general public license version",
            "gnu affero general public license version",
        ],
    },
    Rule {
        id: "GPL-2.0",
        all: &["gnu general public license version 2"],
        none: &[
            "gnu lesser general public license version",
            "gnu affero general public license version",
        ],
    },
    Rule {
        id: "Apache-2.0",
        all: &["apache license", "version 2.0"],
        none: &[],
    },
    Rule {
        id: "MPL-2.0",
        all: &["mozilla public license", "2.0"],
        none: &[],
    },
    Rule {
        id: "EPL-2.0",
        all: &["eclipse public license", "2.0"],
        none: &[],
    },
    Rule {
        id: "EPL-1.0",
        all: &["eclipse public license", "1.0"],
        none: &["2.0"],
    },
    Rule {
        id: "BSD-3-Clause",
        all: &["redistribution and use in source and binary forms", "neither the name"],
        none: &[],
    },
    Rule {
        id: "BSD-2-Clause",
        all: &["redistribution and use in source and binary forms"],
        none: &["neither the name"],
    },
    Rule {
        id: "ISC",
        all: &["permission to use, copy, modify, and/or distribute this software for any purpose"],
        none: &[],
    },
    Rule {
        id: "MIT",
        all: &["permission is hereby granted, free of charge"],
        none: &[],
    },
    Rule {
        id: "Unlicense",
        all: &["this is free and unencumbered software released into the public domain"],
        none: &[],
    },
    Rule {
        id: "CC0-1.0",
        all: &["cc0 1.0 universal"],
        none: &[],
    },
];

const TAG: &str = "SPDX-License-Identifier:";

/// SPDX identifiers recognized in `text`, deduplicated, in match order.
pub fn identify(text: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    let mut push = |id: &str| {
        if !found.iter().any(|f| f == id) {
            found.push(id.to_string());
        }
    };

    let tagged: Vec<&str> = text
        .lines()
        .filter_map(|line| line.split_once(TAG))
        .map(|(_, expr)| expr.trim())
        .filter(|expr| !expr.is_empty())
        .collect();
    if !tagged.is_empty() {
        tagged.into_iter().for_each(&mut push);
        return found;
    }

    let normalized = normalize(text);
    RULES
        .iter()
        .filter(|rule| rule.all.iter().all(|p| normalized.contains(p)))
        .filter(|rule| !rule.none.iter().any(|p| normalized.contains(p)))
        .for_each(|rule| push(rule.id));
    found
}

/// Lower-case and collapse all whitespace runs to one space.
fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
