use std::fmt::Write as _;

use unicode_general_category::GeneralCategory;
use unicode_general_category::get_general_category;

use crate::glob::file_name;
use crate::glob::file_stem;

/// Substitution names for characters that cannot appear in an identifier.
const CHARACTER_NAMES: [(char, &str); 35] = [
	('.', "dot"),
	('-', "minus"),
	('+', "plus"),
	('*', "times"),
	('/', "slash"),
	('%', "pct"),
	('<', "lt"),
	('>', "gt"),
	('=', "eq"),
	('&', "amp"),
	('|', "pipe"),
	('^', "hat"),
	('!', "excl"),
	('?', "quest"),
	(':', "colon"),
	(',', "comma"),
	(';', "semi"),
	('~', "tilde"),
	('`', "grave"),
	('@', "at"),
	('#', "hash"),
	('$', "dollar"),
	('\\', "backslash"),
	('\'', "apos"),
	('"', "quot"),
	('[', "start"),
	(']', "end"),
	('{', "begin"),
	('}', "finish"),
	('(', "open"),
	(')', "close"),
	(' ', "space"),
	('\t', "tab"),
	('\r', "CR"),
	('\n', "LF"),
];

/// Derive the constant name for the asset at `path`.
///
/// The file name without its extension is tried first. When that mangles to
/// nothing, or collides with the enclosing type's own name, the full file
/// name is used instead.
pub fn constant_name(path: &str, enclosing_name: &str) -> String {
	let name = file_name(path);
	let candidate = mangle_identifier(file_stem(name));
	if candidate.is_empty() || candidate == enclosing_name {
		return mangle_identifier(name);
	}

	candidate
}

/// Turn an arbitrary string into a valid identifier.
///
/// Invalid characters become `_<name>_` from the substitution table or
/// `_u<HEX>_` otherwise; adjacent substitutions share one underscore. A name
/// that does not start with a letter or underscore gets a leading underscore,
/// and the first character is upper-cased.
pub fn mangle_identifier(raw: &str) -> String {
	let mut mangled = String::with_capacity(raw.len());
	let mut previous_escaped = false;

	for c in raw.chars() {
		if is_identifier_char(c) {
			mangled.push(c);
			previous_escaped = false;
			continue;
		}

		if !previous_escaped {
			mangled.push('_');
		}

		match character_name(c) {
			Some(name) => mangled.push_str(name),
			None => {
				let _ = write!(mangled, "u{:X}", u32::from(c));
			}
		}

		mangled.push('_');
		previous_escaped = true;
	}

	if mangled
		.chars()
		.next()
		.is_some_and(|first| first != '_' && !is_letter(first))
	{
		mangled.insert(0, '_');
	}

	upper_case_first(&mangled)
}

fn character_name(c: char) -> Option<&'static str> {
	CHARACTER_NAMES
		.iter()
		.find(|(candidate, _)| *candidate == c)
		.map(|(_, name)| *name)
}

/// Letters, decimal digits, connector punctuation, combining marks and
/// formatting characters. Code points outside the Basic Multilingual Plane
/// are never accepted.
fn is_identifier_char(c: char) -> bool {
	if u32::from(c) > 0xFFFF {
		return false;
	}

	is_letter(c)
		|| matches!(
			get_general_category(c),
			GeneralCategory::LetterNumber
				| GeneralCategory::DecimalNumber
				| GeneralCategory::ConnectorPunctuation
				| GeneralCategory::NonspacingMark
				| GeneralCategory::SpacingMark
				| GeneralCategory::Format
		)
}

fn is_letter(c: char) -> bool {
	matches!(
		get_general_category(c),
		GeneralCategory::UppercaseLetter
			| GeneralCategory::LowercaseLetter
			| GeneralCategory::TitlecaseLetter
			| GeneralCategory::ModifierLetter
			| GeneralCategory::OtherLetter
	)
}

fn upper_case_first(name: &str) -> String {
	let mut chars = name.chars();
	let Some(first) = chars.next() else {
		return String::new();
	};

	let mut upper = first.to_uppercase();
	let replacement = match (upper.next(), upper.next()) {
		(Some(single), None) => single,
		_ => first,
	};

	let mut result = String::with_capacity(name.len());
	result.push(replacement);
	result.push_str(chars.as_str());
	result
}
