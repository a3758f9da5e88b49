//! Well-known names shared by the frontend and the engine.

/// Prefix that marks a procedure as a test (`def test_<entry>(): ...`).
pub const TEST_PREFIX: &str = "test_";

/// Binding that receives the value of an evaluated left-hand expression during assertion rewriting.
pub const RESULT_BINDING: &str = "_result_";

/// Procedure name used by tests that follow the `check(candidate)` protocol.
pub const CHECK_PROTOCOL_NAME: &str = "check";

/// Standard-library imports prepended to every composed sandbox source.
///
/// Candidate programs routinely rely on these names without importing them.
pub const PREAMBLE: &str = "\
import sys
import time
import itertools
from itertools import accumulate, product, permutations, combinations
import collections
from collections import Counter, OrderedDict, deque, defaultdict, ChainMap
from functools import lru_cache
import math
from math import sqrt, sin, cos, tan, ceil, fabs, floor, gcd, exp, log, log2
import fractions
from typing import List, Tuple
import random
import heapq
from heapq import *
";

/// Name of the test procedure for an entry point (`reverse` → `test_reverse`).
pub fn test_procedure_name(entry_name: &str) -> String {
    format!("{TEST_PREFIX}{entry_name}")
}

/// Return `true` if a procedure name carries the test prefix in use (normally [`TEST_PREFIX`]).
pub fn is_test_procedure(name: &str, prefix: &str) -> bool {
    name.starts_with(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_procedure_naming() {
        assert_eq!(test_procedure_name("f"), "test_f");
        assert!(is_test_procedure("test_f", TEST_PREFIX));
        assert!(!is_test_procedure("check", TEST_PREFIX));
        assert!(is_test_procedure("spec_f", "spec_"));
        assert!(!is_test_procedure("test_f", "spec_"));
    }

    #[test]
    fn test_preamble_is_line_terminated() {
        assert!(PREAMBLE.ends_with('\n'));
        assert!(PREAMBLE.lines().all(|l| l.starts_with("import") || l.starts_with("from")));
    }
}
