//! Mapping from VLP source-level type names to LLVM IR type fragments.

/// An unknown or missing source type defaults to `i32`, same as an empty
/// type annotation.
pub fn map_type(ty: &str) -> &'static str {
    match ty {
        "int" | "" => "i32",
        "float" => "double",
        "bool" => "i1",
        "string" => "i8*",
        "void" => "void",
        _ => "i32",
    }
}

/// Stack-slot alignment for an LLVM IR type fragment.
pub fn alignment_for(llvm_type: &str) -> u32 {
    match llvm_type {
        "double" | "i8*" | "i64" => 8,
        _ => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_and_empty_types_default_to_i32() {
        assert_eq!(map_type(""), "i32");
        assert_eq!(map_type("widget"), "i32");
    }

    #[test]
    fn known_types_map_correctly() {
        assert_eq!(map_type("float"), "double");
        assert_eq!(map_type("bool"), "i1");
        assert_eq!(map_type("string"), "i8*");
        assert_eq!(map_type("void"), "void");
    }

    #[test]
    fn alignment_matches_word_size_for_wide_types() {
        assert_eq!(alignment_for("double"), 8);
        assert_eq!(alignment_for("i8*"), 8);
        assert_eq!(alignment_for("i64"), 8);
        assert_eq!(alignment_for("i32"), 4);
        assert_eq!(alignment_for("i1"), 4);
    }
}
