//! Tests for doc and poll subcommands, including audience flags.

use super::{parse, parse_err};
use crate::cli::{CliCommand, DocCommand, PollCommand};
use mcm_core::targeting::Targeting;

#[test]
fn cli_parse_doc_add_broadcast_by_default() {
    match parse(&["mcm", "doc", "add", "Club rules"]) {
        CliCommand::Doc(DocCommand::Add { title, target }) => {
            assert_eq!(title, "Club rules");
            assert_eq!(target.to_targeting().unwrap(), Targeting::Broadcast);
        }
        other => panic!("expected doc add, got {other:?}"),
    }
}

#[test]
fn cli_parse_doc_add_for_role() {
    match parse(&["mcm", "doc", "add", "Minutes", "--role", "board"]) {
        CliCommand::Doc(DocCommand::Add { target, .. }) => {
            assert_eq!(
                target.to_targeting().unwrap(),
                Targeting::Role("board".into())
            );
        }
        other => panic!("expected doc add, got {other:?}"),
    }
}

#[test]
fn cli_parse_doc_add_for_member() {
    match parse(&["mcm", "doc", "add", "Invoice", "--member", "12"]) {
        CliCommand::Doc(DocCommand::Add { target, .. }) => {
            assert_eq!(target.to_targeting().unwrap(), Targeting::Individual(12));
        }
        other => panic!("expected doc add, got {other:?}"),
    }
}

#[test]
fn cli_parse_doc_role_and_member_conflict() {
    parse_err(&["mcm", "doc", "add", "X", "--role", "board", "--member", "1"]);
}

#[test]
fn cli_parse_doc_stats_and_open() {
    match parse(&["mcm", "doc", "stats", "4"]) {
        CliCommand::Doc(DocCommand::Stats { id }) => assert_eq!(id, 4),
        other => panic!("expected doc stats, got {other:?}"),
    }
    match parse(&["mcm", "doc", "open", "4", "--member", "9"]) {
        CliCommand::Doc(DocCommand::Open { id, member }) => {
            assert_eq!(id, 4);
            assert_eq!(member, 9);
        }
        other => panic!("expected doc open, got {other:?}"),
    }
}

#[test]
fn cli_parse_poll_add_collects_options() {
    match parse(&[
        "mcm",
        "poll",
        "add",
        "Rally destination?",
        "--option",
        "Alps",
        "--option",
        "Coast",
        "--role",
        "board",
    ]) {
        CliCommand::Poll(PollCommand::Add {
            question,
            options,
            target,
        }) => {
            assert_eq!(question, "Rally destination?");
            assert_eq!(options, vec!["Alps".to_string(), "Coast".to_string()]);
            assert_eq!(
                target.to_targeting().unwrap(),
                Targeting::Role("board".into())
            );
        }
        other => panic!("expected poll add, got {other:?}"),
    }
}

#[test]
fn cli_parse_poll_add_requires_options() {
    parse_err(&["mcm", "poll", "add", "Rally destination?"]);
}

#[test]
fn cli_parse_poll_vote() {
    match parse(&["mcm", "poll", "vote", "2", "1", "--member", "5"]) {
        CliCommand::Poll(PollCommand::Vote { id, option, member }) => {
            assert_eq!(id, 2);
            assert_eq!(option, 1);
            assert_eq!(member, 5);
        }
        other => panic!("expected poll vote, got {other:?}"),
    }
}
