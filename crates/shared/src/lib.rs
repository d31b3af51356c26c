//! Process bootstrap shared by Agenda binaries

pub mod bootstrap;
