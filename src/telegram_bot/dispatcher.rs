use crate::leetcode::{self, Category};
use crate::messages;
use crate::scheduler::SchedulerControlCommand;
use crate::subscribers::{SubscriberStore, Toggle};
use miette::{miette, IntoDiagnostic, Result};
use std::sync::Arc;
use teloxide::dispatching::{ShutdownToken, UpdateHandler};
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use teloxide::{dptree, Bot};
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;

#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "These commands are supported:")]
enum ChannelCommand {
    #[command(description = "Send this message.")]
    Help,
    #[command(description = "Fetch today's LeetCode problem.")]
    Today,
    #[command(description = "Fetch a random problem.\n\tUsage: /random [hot|all|sql|interview|75]")]
    Random(String),
    #[command(description = "Toggle the daily problem push for this chat.")]
    Subscribe,
}

async fn help(bot: Bot, msg: Message) -> Result<()> {
    bot.send_message(msg.chat.id, ChannelCommand::descriptions().to_string())
        .await
        .into_diagnostic()?;
    Ok(())
}

async fn today(bot: Bot, lc_client: Arc<leetcode::Client>, msg: Message) -> Result<()> {
    let reply = match lc_client.fetch_today().await {
        Ok(problem) => messages::daily_problem(&problem),
        Err(leetcode::Error::Empty) => "⚠️ 今日没有每日一题。".to_owned(),
        Err(error) => {
            log::warn!("Could not fetch today's problem: {error}");
            "⚠️ 无法获取每日一题，请稍后再试。".to_owned()
        }
    };
    bot.send_message(msg.chat.id, reply).await.into_diagnostic()?;
    Ok(())
}

async fn random(
    bot: Bot,
    lc_client: Arc<leetcode::Client>,
    command: ChannelCommand,
    msg: Message,
) -> Result<()> {
    if let ChannelCommand::Random(token) = command {
        let category = Category::from_token(&token);
        let reply = match lc_client.fetch_by_category(category).await {
            Err(error) => {
                log::warn!("Could not fetch the {} listing: {error}", category.label());
                "⚠️ 无法获取题库列表，请稍后再试。".to_owned()
            }
            Ok(problems) => match leetcode::pick_random(&problems) {
                None => format!("⚠️ 分类 `{}` 下没有题目。", category.label()),
                Some(summary) => match lc_client.problem_content(&summary.slug).await {
                    Ok(content) => {
                        messages::random_problem(category, &summary.clone().into_problem(content))
                    }
                    Err(error) => {
                        // degrade to headline plus link, the pick still goes out
                        log::warn!("Could not fetch the statement of {}: {error}", summary.slug);
                        messages::random_problem_link(category, summary)
                    }
                },
            },
        };
        bot.send_message(msg.chat.id, reply).await.into_diagnostic()?;
        Ok(())
    } else {
        Err(miette!(
            "Handler for random command did not receive correct data"
        ))
    }
}

async fn subscribe(
    bot: Bot,
    store: Arc<RwLock<SubscriberStore>>,
    sched_send: mpsc::UnboundedSender<SchedulerControlCommand>,
    msg: Message,
) -> Result<()> {
    let chat_id = msg.chat.id;
    let toggle = store.write().await.toggle(chat_id);
    let reply = match toggle {
        Ok(Toggle::Added) => {
            if let Err(error) = sched_send.send(SchedulerControlCommand::StartDailyPush) {
                log::error!("Could not request daily push activation: {error}");
            }
            "✅ 已开启本会话的每日一题推送（每天 9:00）".to_owned()
        }
        Ok(Toggle::Removed) => "❌ 已取消本会话的每日一题推送。".to_owned(),
        Err(report) => {
            log::error!("Could not persist the subscription toggle for {chat_id}: {report:?}");
            "⚠️ 订阅状态保存失败，请稍后再试。".to_owned()
        }
    };
    bot.send_message(chat_id, reply).await.into_diagnostic()?;
    Ok(())
}

fn schema() -> UpdateHandler<miette::Error> {
    use dptree::case;

    let command_handler = teloxide::filter_command::<ChannelCommand, _>()
        .branch(case![ChannelCommand::Help].endpoint(help))
        .branch(case![ChannelCommand::Today].endpoint(today))
        .branch(case![ChannelCommand::Random(category)].endpoint(random))
        .branch(case![ChannelCommand::Subscribe].endpoint(subscribe));

    Update::filter_message().branch(command_handler)
}

pub async fn setup(
    bot: Bot,
    sched_send: mpsc::UnboundedSender<SchedulerControlCommand>,
    lc_client: Arc<leetcode::Client>,
    store: Arc<RwLock<SubscriberStore>>,
) -> (ShutdownToken, JoinHandle<()>) {
    let mut dispatcher = Dispatcher::builder(bot.clone(), schema())
        .dependencies(dptree::deps![sched_send, lc_client, store])
        .build();
    let shutdown_token = dispatcher.shutdown_token();
    let join_handle = tokio::spawn(async move { dispatcher.dispatch().await });
    (shutdown_token, join_handle)
}
