use std::{io, path::Path};

use crate::{error::Error, format::FileFormat};

/// Reads `source`, re-encodes it and writes the result to `dest`.
///
/// Formats default to the file extensions, falling back to YAML in and JSON
/// out. The destination is only opened once the output is fully encoded.
pub fn convert(
    source: &Path,
    dest: &Path,
    from: Option<FileFormat>,
    to: Option<FileFormat>,
) -> Result<(), Error> {
    let from = from
        .or_else(|| FileFormat::from_path(source))
        .unwrap_or(FileFormat::Yaml);
    let to = to
        .or_else(|| FileFormat::from_path(dest))
        .unwrap_or(FileFormat::Json);

    let input = std::fs::read_to_string(source).map_err(|e| match e.kind() {
        // readable, but not text
        io::ErrorKind::InvalidData => Error::MalformedSource {
            path: source.to_path_buf(),
            format: from,
            msg: e.to_string(),
        },
        _ => Error::SourceNotFound {
            path: source.to_path_buf(),
            source: e,
        },
    })?;
    let value = from.decode(&input, source)?;
    let output = to.encode(&value)?;
    std::fs::write(dest, output).map_err(|e| Error::DestinationUnwritable {
        path: dest.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    #[test]
    fn yaml_file_to_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("schema.yaml");
        let dest = dir.path().join("schema.json");
        std::fs::write(&source, "# widget\nname: widget\ncount: 3\ntags:\n  - a\n  - b\n").unwrap();

        convert(&source, &dest, None, None).unwrap();

        let out = std::fs::read_to_string(&dest).unwrap();
        assert_eq!(
            serde_json::from_str::<Value>(&out).unwrap(),
            json!({"name": "widget", "count": 3, "tags": ["a", "b"]})
        );
        assert!(!out.ends_with('\n'));
    }

    #[test]
    fn unknown_extensions_default_to_yaml_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("schema.txt");
        let dest = dir.path().join("schema.out");
        std::fs::write(&source, "{a: [1, 2]}").unwrap();

        convert(&source, &dest, None, None).unwrap();

        let out = std::fs::read_to_string(&dest).unwrap();
        assert_eq!(out, "{\n  \"a\": [\n    1,\n    2\n  ]\n}");
    }

    #[test]
    fn explicit_formats_win_over_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("schema.json");
        let dest = dir.path().join("schema.json.out");
        std::fs::write(&source, "title = \"t\"\n").unwrap();

        convert(&source, &dest, Some(FileFormat::Toml), Some(FileFormat::Yaml)).unwrap();

        let out = std::fs::read_to_string(&dest).unwrap();
        assert_eq!(out.trim(), "title: t");
    }

    #[test]
    fn existing_destination_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("s.yaml");
        let dest = dir.path().join("d.json");
        std::fs::write(&source, "x: 1\n").unwrap();
        std::fs::write(&dest, "stale content that is much longer than the output").unwrap();

        convert(&source, &dest, None, None).unwrap();

        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "{\n  \"x\": 1\n}");
    }

    #[test]
    fn missing_source_leaves_destination_alone() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("d.json");

        let err = convert(&dir.path().join("missing.yaml"), &dest, None, None).unwrap_err();

        assert!(matches!(err, Error::SourceNotFound { .. }));
        assert!(!dest.exists());
    }

    #[test]
    fn malformed_source_never_opens_destination() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("s.yaml");
        let dest = dir.path().join("d.json");
        std::fs::write(&source, "a: [1, 2\nb: }\n").unwrap();

        let err = convert(&source, &dest, None, None).unwrap_err();

        assert!(matches!(err, Error::MalformedSource { .. }));
        assert!(!dest.exists());
    }

    #[test]
    fn unrepresentable_value_never_opens_destination() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("s.yaml");
        let dest = dir.path().join("d.toml");
        std::fs::write(&source, "a: ~\n").unwrap();

        let err = convert(&source, &dest, None, None).unwrap_err();

        assert!(matches!(err, Error::Unrepresentable(_)));
        assert!(!dest.exists());
    }

    #[test]
    fn non_utf8_source_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("s.yaml");
        let dest = dir.path().join("d.json");
        std::fs::write(&source, [b'a', b':', b' ', 0xff, 0xfe, b'\n']).unwrap();

        let err = convert(&source, &dest, None, None).unwrap_err();

        assert!(matches!(
            err,
            Error::MalformedSource {
                format: FileFormat::Yaml,
                ..
            }
        ));
        assert!(!dest.exists());
    }

    #[test]
    fn empty_and_comment_only_sources_become_null() {
        let dir = tempfile::tempdir().unwrap();
        for (name, text) in [("empty.yaml", ""), ("comments.yaml", "# only a comment\n")] {
            let source = dir.path().join(name);
            let dest = dir.path().join(name).with_extension("json");
            std::fs::write(&source, text).unwrap();

            convert(&source, &dest, None, None).unwrap();

            assert_eq!(std::fs::read_to_string(&dest).unwrap(), "null");
        }
    }

    #[test]
    fn repeated_keys_keep_the_last_value() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("s.yaml");
        let dest = dir.path().join("d.json");
        std::fs::write(&source, "a: 1\nb: 2\na: 3\n").unwrap();

        convert(&source, &dest, None, None).unwrap();

        assert_eq!(
            std::fs::read_to_string(&dest).unwrap(),
            "{\n  \"a\": 3,\n  \"b\": 2\n}"
        );
    }

    #[test]
    fn integers_wider_than_64_bits_are_unrepresentable() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("s.yaml");
        let dest = dir.path().join("d.json");
        std::fs::write(&source, "a: 123456789012345678901234567890\n").unwrap();

        let err = convert(&source, &dest, None, None).unwrap_err();

        assert!(matches!(err, Error::Unrepresentable(_)));
        assert!(!dest.exists());
    }

    #[test]
    fn destination_directory_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("s.yaml");
        std::fs::write(&source, "a: 1\n").unwrap();

        let err = convert(&source, &dir.path().join("nope/d.json"), None, None).unwrap_err();

        assert!(matches!(err, Error::DestinationUnwritable { .. }));
    }
}
