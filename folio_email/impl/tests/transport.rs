//! Failure classification against local peers that never speak smtp.

use std::time::{Duration, Instant};

use folio_email_contracts::{Email, EmailBody, EmailFailureKind, EmailService};
use folio_email_impl::{EmailServiceConfig, EmailServiceImpl, SmtpAccount};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::TcpListener,
};

#[tokio::test]
async fn connection_refused() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    let sut = make_sut(port);

    let result = sut.send(email()).await;

    assert_eq!(result.unwrap_err().kind, EmailFailureKind::Connection);
}

#[tokio::test]
async fn silent_server_times_out() {
    // The kernel completes the tcp handshake, but nobody ever sends a greeting.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let sut = make_sut(port);

    let started = Instant::now();
    let result = sut.send(email()).await;

    assert_eq!(result.unwrap_err().kind, EmailFailureKind::Timeout);
    assert!(started.elapsed() < Duration::from_secs(5));
    drop(listener);
}

#[tokio::test]
async fn ping_unreachable_server() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    let sut = make_sut(port);

    assert!(sut.ping().await.is_err());
}

#[tokio::test]
async fn rejected_credentials() {
    let port = reply_to_everything("535 5.7.8 Authentication credentials invalid").await;
    let sut = make_sut(port);

    let result = sut.send(email()).await;

    assert_eq!(result.unwrap_err().kind, EmailFailureKind::Authentication);
}

#[tokio::test]
async fn other_rejection_is_unknown() {
    let port = reply_to_everything("554 5.7.1 Transaction failed").await;
    let sut = make_sut(port);

    let result = sut.send(email()).await;

    assert_eq!(result.unwrap_err().kind, EmailFailureKind::Unknown);
}

/// Start a peer that greets and then answers every command with `reply`.
async fn reply_to_everything(reply: &'static str) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                let (read, mut write) = stream.into_split();
                write.write_all(b"220 localhost ESMTP\r\n").await?;
                let mut lines = BufReader::new(read).lines();
                while lines.next_line().await?.is_some() {
                    write.write_all(format!("{reply}\r\n").as_bytes()).await?;
                }
                std::io::Result::Ok(())
            });
        }
    });

    port
}

fn make_sut(port: u16) -> EmailServiceImpl {
    EmailServiceImpl::new(EmailServiceConfig {
        host: "127.0.0.1".into(),
        port,
        connection_timeout: Duration::from_millis(300),
        send_timeout: Duration::from_millis(500),
        pool_max_size: 1,
        account: Some(SmtpAccount {
            username: "relay@example.com".into(),
            password: "secret".to_owned().into(),
            from: "noreply@example.com".parse().unwrap(),
        }),
    })
}

fn email() -> Email {
    Email {
        recipient: "contact@example.com".parse().unwrap(),
        subject: "Test".into(),
        body: EmailBody::Text("Hello".into()),
        reply_to: None,
    }
}
