//
// Copyright 2025 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Name collation for alphabetical ordering
//!
//! Character and player names are mostly German, so a plain byte comparison
//! would push `Ärwin` behind `Zora` and `bob` behind `Zora`. Names are compared
//! on a folded primary key first and only fall back to case when the folded
//! keys are equal, lower case first.

use std::cmp::Ordering;

/// Build the primary collation key for a name
fn primary_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len());
    for c in name.chars().flat_map(char::to_lowercase) {
        match c {
            'ä' | 'á' | 'à' | 'â' => key.push('a'),
            'ö' | 'ó' | 'ò' | 'ô' => key.push('o'),
            'ü' | 'ú' | 'ù' | 'û' => key.push('u'),
            'é' | 'è' | 'ê' | 'ë' => key.push('e'),
            'í' | 'ì' | 'î' | 'ï' => key.push('i'),
            'ß' => key.push_str("ss"),
            other => key.push(other),
        }
    }
    key
}

/// Compare two names the way a locale aware string comparison would
pub fn compare_names(a: &str, b: &str) -> Ordering {
    primary_key(a)
        .cmp(&primary_key(b))
        // Lower case before upper case on otherwise equal names.
        .then_with(|| b.cmp(a))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_primary_order() {
        assert_eq!(compare_names("bob", "Zora"), Ordering::Less);
        assert_eq!(compare_names("Alrik", "bernd"), Ordering::Less);
    }

    #[test]
    fn test_umlauts_fold_to_base_letter() {
        assert_eq!(compare_names("Ärwin", "Bert"), Ordering::Less);
        assert_eq!(compare_names("Öland", "Pia"), Ordering::Less);
        assert_eq!(compare_names("Straße", "Strasse"), Ordering::Less);
    }

    #[test]
    fn test_lower_case_sorts_first_on_tie() {
        assert_eq!(compare_names("kasim", "Kasim"), Ordering::Less);
        assert_eq!(compare_names("Kasim", "kasim"), Ordering::Greater);
        assert_eq!(compare_names("Kasim", "Kasim"), Ordering::Equal);
    }

    #[test]
    fn test_sorting_a_list() {
        let mut names = vec!["Lumaer", "janosch", "Kasim", "Ärwin"];
        names.sort_by(|a, b| compare_names(a, b));
        assert_eq!(names, vec!["Ärwin", "janosch", "Kasim", "Lumaer"]);
    }
}
