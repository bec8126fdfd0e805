//! Shared test utilities for integration tests
//!
//! Provides a small Fortran project fixture used across test files.

#![allow(dead_code)]

use assert_fs::prelude::*;

pub const SOLVER: &str = "\
module solver
  implicit none
contains
  subroutine init(n)
    integer, intent(in) :: n
  end subroutine init

  real function residual(x)
    real, intent(in) :: x
    residual = x * 0.5
  end function residual
end module solver
";

pub const MAIN: &str = "\
program main
  use solver
  call init(10)
end program main
";

/// Project with two sources, a non-Fortran file and an ignored build dir.
pub fn make_fortran_fixture() -> assert_fs::TempDir
{
    // Initialize the temporary project root
    let tmp = assert_fs::TempDir::new().expect("tempdir");

    tmp.child("src/solver.f90")
        .write_str(SOLVER)
        .expect("write solver");
    tmp.child("src/main.f90")
        .write_str(MAIN)
        .expect("write main");

    // Noise the walker must skip
    tmp.child("README.md")
        .write_str("# call init here too\n")
        .expect("write readme");
    tmp.child("build/generated.f90")
        .write_str("subroutine init\nend\n")
        .expect("write build output");

    tmp
}
