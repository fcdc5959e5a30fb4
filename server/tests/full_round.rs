use std::time::Duration;

use futures::{Sink, SinkExt, Stream, StreamExt};

use cardczar_game::engine;
use cardczar_game::model::Player;
use cardczar_game::protocol::{
    IntroductionRequest, IntroductionResponse, JoinResponse, Notification, PlayRequest,
    PlayResponse, RankRequest, RankResponse, Request, Response, StartResponse,
};
use cardczar_server::{run, settings};

async fn send<S>(stream: &mut S, req: Request)
where
    S: Sink<tungstenite::Message> + Unpin,
    S::Error: std::fmt::Debug,
{
    let bytes = bincode::serialize(&req).expect("serialization to work");
    stream
        .send(tungstenite::Message::binary(bytes))
        .await
        .expect("server to be up");
}

async fn recv<S>(stream: &mut S) -> Response
where
    S: Stream<Item = Result<tungstenite::Message, tungstenite::Error>> + Unpin,
{
    let bytes = stream
        .next()
        .await
        .expect("server to respond")
        .expect("message to arrive")
        .into_data();
    bincode::deserialize(&bytes).expect("deserialization to work")
}

fn write_assets() -> (String, String) {
    let dir = std::env::temp_dir();
    let prompts = dir.join("cardczar_test_prompts.txt");
    let responses = dir.join("cardczar_test_responses.txt");
    std::fs::write(&prompts, "cards=Tonight we dine on __________.").expect("temp file");
    let cards: Vec<String> = (0..24).map(|i| format!("card number {}", i)).collect();
    std::fs::write(&responses, format!("cards={}", cards.join("<>"))).expect("temp file");
    (
        prompts.to_str().unwrap().to_string(),
        responses.to_str().unwrap().to_string(),
    )
}

// Drive one complete round over real WebSockets: three clients introduce
// themselves, one starts as judge, two join and play, the judge ranks, and
// everyone hears the reveal. Then the server shuts down gracefully.
#[tokio::test(core_threads = 4)]
async fn full_round_over_websockets() {
    flexi_logger::Logger::with_env()
        .format(|w, now, r| flexi_logger::with_thread(w, now, r))
        .start()
        .ok();

    let (prompt_cards_path, response_cards_path) = write_assets();
    let bind_addr = "127.0.0.1:8090";
    let url = "ws://127.0.0.1:8090/game";
    let settings = settings::Server {
        bind_addr: bind_addr.into(),
        prompt_cards_path,
        response_cards_path,
    };
    let (shutdown_tx, shutdown_rx) = piper::chan(0);
    let game = engine::Settings::default();
    let server = tokio::spawn(async move { run(settings, game, shutdown_rx).await.ok() });

    // Hack: wait a bit for the server to be ready.
    tokio::time::delay_for(Duration::from_millis(150)).await;

    let (mut judge, _) = tokio_tungstenite::connect_async(url).await.expect("connect");
    let (mut p1, _) = tokio_tungstenite::connect_async(url).await.expect("connect");
    let (mut p2, _) = tokio_tungstenite::connect_async(url).await.expect("connect");

    // introductions
    for (stream, name) in vec![
        (&mut judge, "judge"),
        (&mut p1, "p1"),
        (&mut p2, "p2"),
    ] {
        send(
            stream,
            IntroductionRequest {
                player: Player::new(name),
            }
            .into(),
        )
        .await;
        assert_eq!(
            recv(stream).await,
            Response::Introduction(IntroductionResponse::Success)
        );
    }

    // the judge starts a round; the other clients are notified
    send(&mut judge, Request::Start).await;
    assert_eq!(
        recv(&mut judge).await,
        Response::Start(StartResponse {
            prompt: "Tonight we dine on __________.".into(),
            blank_count: 1,
        })
    );
    for stream in vec![&mut p1, &mut p2] {
        match recv(stream).await {
            Response::Notification(Notification::RoundStarted { judge, prompt, .. }) => {
                assert_eq!(judge, Player::new("judge"));
                assert_eq!(prompt, "Tonight we dine on __________.");
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    // both players join and are dealt disjoint ten-card hands
    send(&mut p1, Request::Join).await;
    let hand1 = match recv(&mut p1).await {
        Response::Join(JoinResponse::Dealt { cards }) => cards,
        other => panic!("unexpected message: {:?}", other),
    };
    send(&mut p2, Request::Join).await;
    let hand2 = match recv(&mut p2).await {
        Response::Join(JoinResponse::Dealt { cards }) => cards,
        other => panic!("unexpected message: {:?}", other),
    };
    assert_eq!(hand1.len(), 10);
    assert_eq!(hand2.len(), 10);
    assert!(hand1.iter().all(|card| !hand2.contains(card)));

    // plays reach the judge as numbered submissions
    send(&mut p1, PlayRequest { indices: vec![0] }.into()).await;
    assert_eq!(recv(&mut p1).await, Response::Play(PlayResponse::Accepted));
    match recv(&mut judge).await {
        Response::Notification(Notification::SubmissionReceived {
            submission,
            player_count,
            answer,
        }) => {
            assert_eq!(submission, 0);
            assert_eq!(player_count, 2);
            assert_eq!(answer, format!("Tonight we dine on {}. ", hand1[0]));
        }
        other => panic!("unexpected message: {:?}", other),
    }

    send(&mut p2, PlayRequest { indices: vec![3] }.into()).await;
    assert_eq!(recv(&mut p2).await, Response::Play(PlayResponse::Accepted));
    match recv(&mut judge).await {
        Response::Notification(Notification::SubmissionReceived { submission, .. }) => {
            assert_eq!(submission, 1)
        }
        other => panic!("unexpected message: {:?}", other),
    }

    // worst-first ranking: p1 takes 2nd place, p2 wins
    send(&mut judge, RankRequest { ranking: vec![0, 1] }.into()).await;
    for stream in vec![&mut judge, &mut p1, &mut p2] {
        match recv(stream).await {
            Response::Notification(Notification::Placement {
                place,
                player,
                answer,
            }) => {
                assert_eq!(place, 2);
                assert_eq!(player, Player::new("p1"));
                assert_eq!(answer, format!("Tonight we dine on {}. ", hand1[0]));
            }
            other => panic!("unexpected message: {:?}", other),
        }
        match recv(stream).await {
            Response::Notification(Notification::Winner { player, answer }) => {
                assert_eq!(player, Player::new("p2"));
                assert_eq!(answer, format!("Tonight we dine on {}. ", hand2[3]));
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }
    assert_eq!(recv(&mut judge).await, Response::Rank(RankResponse::Concluded));

    // the round is over; joining again finds nothing
    send(&mut p1, Request::Join).await;
    assert_eq!(
        recv(&mut p1).await,
        Response::Join(JoinResponse::NoActiveRound)
    );

    // Tell server to shutdown.
    drop(shutdown_tx);
    let stats = server
        .await
        .expect("server shutdown smoothly")
        .expect("server shutdown smoothly");
    assert_eq!(stats.total_accepted_connections, 3);
    drop((judge, p1, p2));
}
