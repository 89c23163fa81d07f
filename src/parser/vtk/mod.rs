pub mod vtp;
