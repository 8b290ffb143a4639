mod load {

    use std::io::BufReader;

    use magic_tree::{magic::builtin, Error, MagicSet, ParseError, TestFlags, Warning};

    const RULES: &str = "\
# comment lines and blank lines are skipped

0\tstring\tABCD\tfour letters
!:mime\ttext/x-abcd
>4\tbyte\t0x31\tone
>>5\tbyte\t0x32\ttwo
>4\tbyte\t0x33\tthree
0\tbelong\t0xcafebabe\tcafe
0\tbogus\t1\tbroken
>0\tbyte\t1\tlost child
!:mime\ttext/plain
";

    fn load(text: &str) -> (MagicSet, Vec<Warning>) {
        let mut warnings = Vec::new();
        let set = MagicSet::load(BufReader::new(text.as_bytes()), "rules", &mut |w: &Warning| {
            warnings.push(w.clone())
        })
        .unwrap();
        (set, warnings)
    }

    #[test]
    fn tree_shape() {
        let (set, _) = load(RULES);
        assert_eq!(set.len(), 5);
        assert_eq!(set.roots().count(), 2);
        let lines: Vec<u32> = set.roots().map(|r| r.line).collect();
        assert_eq!(lines, vec![3, 8]);
    }

    #[test]
    fn discarded_lines_warn() {
        let (_, warnings) = load(RULES);
        let errors: Vec<(u32, ParseError)> = warnings.iter().map(|w| (w.line, w.error.clone())).collect();
        assert_eq!(
            errors,
            vec![
                (9, ParseError::UnknownType("bogus".into())),
                (10, ParseError::Orphan),
                (11, ParseError::DirectiveWithoutRule("!:mime")),
            ]
        );
        assert_eq!(warnings[0].to_string(), "rules, 9: unknown type: bogus");
    }

    #[test]
    fn loaded_rules_evaluate() {
        let (set, _) = load(RULES);
        assert_eq!(set.test(b"ABCD12", TestFlags::empty()).as_deref(), Some("four letters one two"));
        assert_eq!(set.test(b"ABCD3", TestFlags::empty()).as_deref(), Some("four letters three"));
        assert_eq!(set.test(b"ABCD3", TestFlags::MIME).as_deref(), Some("text/x-abcd"));
        assert_eq!(set.test(b"\xca\xfe\xba\xbe", TestFlags::empty()).as_deref(), Some("cafe"));
    }

    #[test]
    fn validate_rejects_bad_files() {
        match MagicSet::validate(RULES.as_bytes(), "rules") {
            Err(Error::InvalidRules { name, warnings }) => {
                assert_eq!(name, "rules");
                assert_eq!(warnings.len(), 3);
            }
            other => panic!("expected InvalidRules, got {:?}", other.map(|s| s.len())),
        }
        assert!(MagicSet::validate(builtin::source().as_bytes(), "builtin").is_ok());
    }

    #[test]
    fn non_utf8_lines_still_load() {
        let mut rules = b"0\tstring\tAB\tab \xff\n".to_vec();
        rules.extend_from_slice(b"0\tstring\tCD\tcd\n");
        let set = MagicSet::from_reader(&rules[..], "bytes").unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.test(b"CD", TestFlags::empty()).as_deref(), Some("cd"));
    }

    #[test]
    fn dump_lists_rules_in_order() {
        let (set, _) = load(RULES);
        let dump = set.dump();
        let first: Vec<&str> = dump.lines().take(2).collect();
        assert_eq!(first, vec!["3 string/four letters (text/x-abcd) [70]", "5> byte/one [0]"]);
    }
}
