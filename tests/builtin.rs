mod builtin {

    use magic_tree::{from_u8, identify, mime_from_u8, BUILTIN};

    fn elf() -> Vec<u8> {
        let mut b = vec![0u8; 20];
        b[..4].copy_from_slice(b"\x7fELF");
        b[4] = 2;
        b[5] = 1;
        b[16] = 3;
        b
    }

    fn pe() -> Vec<u8> {
        let mut b = vec![0u8; 0x48];
        b[..2].copy_from_slice(b"MZ");
        b[0x18] = 0x40;
        b[0x3c] = 0x40;
        b[0x40..0x44].copy_from_slice(b"PE\0\0");
        b
    }

    /// Executables
    #[test]
    fn elf_shared_object() {
        assert_eq!(from_u8(&elf()).as_deref(), Some("ELF 64-bit LSB shared object"));
        assert_eq!(mime_from_u8(&elf()).as_deref(), Some("application/x-executable"));
    }
    #[test]
    fn pe_executable() {
        assert_eq!(from_u8(&pe()).as_deref(), Some("PE32 executable"));
        assert_eq!(mime_from_u8(&pe()).as_deref(), Some("application/x-dosexec"));
    }
    #[test]
    fn dos_executable() {
        let mut b = pe();
        b[0x18] = 0x1c;
        assert_eq!(from_u8(&b).as_deref(), Some("MS-DOS executable"));
    }
    #[test]
    fn java_class() {
        let b = b"\xca\xfe\xba\xbe\x00\x00\x00\x34";
        assert_eq!(from_u8(b).as_deref(), Some("compiled Java class data, version 52.0"));
        assert_eq!(mime_from_u8(b).as_deref(), Some("application/x-java-applet"));
    }

    /// Images
    #[test]
    fn png_dimensions() {
        let mut b = b"\x89PNG\r\n\x1a\n\x00\x00\x00\x0dIHDR".to_vec();
        b.extend_from_slice(&256u32.to_be_bytes());
        b.extend_from_slice(&128u32.to_be_bytes());
        assert_eq!(from_u8(&b).as_deref(), Some("PNG image data, 256 x 128"));
        assert_eq!(mime_from_u8(&b).as_deref(), Some("image/png"));
    }
    #[test]
    fn gif_version() {
        let b = b"GIF89a\x40\x01\xf0\x00";
        assert_eq!(from_u8(b).as_deref(), Some("GIF image data, version 89a, 320 x 240"));
    }

    /// Documents and archives
    #[test]
    fn pdf_version() {
        assert_eq!(from_u8(b"%PDF-1.4\n%").as_deref(), Some("PDF document, version 1.4"));
        assert_eq!(mime_from_u8(b"%PDF-1.4\n%").as_deref(), Some("application/pdf"));
    }
    #[test]
    fn zip_version() {
        let b = b"PK\x03\x04\x14\x00\x00\x00";
        assert_eq!(from_u8(b).as_deref(), Some("Zip archive data, at least v2.0 to extract"));
        assert_eq!(mime_from_u8(b).as_deref(), Some("application/zip"));
    }
    #[test]
    fn gzip_plain() {
        let b = b"\x1f\x8b\x08\x00\x00\x00\x00\x00\x00\x03";
        assert_eq!(from_u8(b).as_deref(), Some("gzip compressed data"));
    }

    /// Text
    #[test]
    fn shell_scripts() {
        assert_eq!(
            from_u8(b"#!/bin/sh\necho hi\n").as_deref(),
            Some("POSIX shell script text executable")
        );
        assert_eq!(
            from_u8(b"#! /bin/bash\nset -e\n").as_deref(),
            Some("Bourne-Again shell script text executable")
        );
        assert_eq!(mime_from_u8(b"#!/bin/sh\n").as_deref(), Some("text/x-shellscript"));
    }
    #[test]
    fn python_via_env() {
        let b = b"#!/usr/bin/env python3\nprint()\n";
        assert_eq!(from_u8(b).as_deref(), Some("Python script text executable"));
        assert_eq!(mime_from_u8(b).as_deref(), Some("text/x-script.python"));
    }
    #[test]
    fn markup() {
        assert_eq!(
            from_u8(b"<?XML version=\"1.0\"?>\n<a/>").as_deref(),
            Some("XML document text")
        );
        assert_eq!(mime_from_u8(b"  \n<HTML><body></body>").as_deref(), Some("text/html"));
        assert_eq!(
            from_u8(b"<!DOCTYPE html>\n<title>t</title>").as_deref(),
            Some("HTML document text")
        );
    }

    /// Fallbacks used by the command line tool
    #[test]
    fn identify_falls_back_to_base_types() {
        assert_eq!(identify(&BUILTIN, b"", false), "empty");
        assert_eq!(identify(&BUILTIN, b"just words\n", false), "ASCII text");
        assert_eq!(identify(&BUILTIN, b"just words\n", true), "text/plain");
        assert_eq!(identify(&BUILTIN, b"\x00\x01\x02\x03", false), "data");
        assert_eq!(identify(&BUILTIN, b"\x00\x01\x02\x03", true), "application/octet-stream");
    }
    #[test]
    fn identify_uses_text_rules_for_text() {
        assert_eq!(
            identify(&BUILTIN, b"#!/bin/sh\nexit 0\n", false),
            "POSIX shell script text executable"
        );
        assert_eq!(identify(&BUILTIN, &elf(), true), "application/x-executable");
    }
}
